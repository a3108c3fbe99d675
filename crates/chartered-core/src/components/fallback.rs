use tracing::info;

use crate::config::FallbackConfig;
use crate::dom::Host;

/// Inject static colours when the engine cannot resolve CSS custom properties
///
/// Returns whether the stylesheet was injected.
pub fn apply_css_fallback(config: &FallbackConfig, host: &mut dyn Host) -> bool {
    if !config.enabled || host.supports_custom_properties() {
        return false;
    }
    info!("CSS custom properties unsupported, injecting fallback styles");
    host.inject_stylesheet(&config.css);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::HeadlessPage;

    #[test]
    fn test_injects_only_without_custom_properties() {
        let config = FallbackConfig::default();

        let mut modern = HeadlessPage::new(800.0);
        assert!(!apply_css_fallback(&config, &mut modern));
        assert!(modern.stylesheets().is_empty());

        let mut legacy = HeadlessPage::new(800.0).without_custom_properties();
        assert!(apply_css_fallback(&config, &mut legacy));
        assert_eq!(legacy.stylesheets(), &[config.css.clone()]);
    }
}
