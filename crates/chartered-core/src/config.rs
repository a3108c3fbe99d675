use serde::{Deserialize, Serialize};

use crate::dom::ObserverSpec;
use crate::motion::EasingType;
use crate::selector::Selector;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub counters: CounterConfig,
    #[serde(default)]
    pub form: FormConfig,
    #[serde(default)]
    pub reveal: RevealConfig,
    #[serde(default)]
    pub smooth_scroll: SmoothScrollConfig,
    #[serde(default)]
    pub lazy_images: LazyImageConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// Class of the progress container appended to the body
    #[serde(default = "default_progress_class")]
    pub progress_class: String,
    /// Class of the bar inside the container whose width tracks progress
    #[serde(default = "default_progress_bar_class")]
    pub progress_bar_class: String,
    /// Elements shifted by the parallax effect
    #[serde(default = "default_parallax_selector")]
    pub parallax_selector: String,
    /// Parallax damping factor applied to the scroll offset
    #[serde(default = "default_parallax_speed")]
    pub parallax_speed: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            progress_class: default_progress_class(),
            progress_bar_class: default_progress_bar_class(),
            parallax_selector: default_parallax_selector(),
            parallax_speed: default_parallax_speed(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// Id of the mobile menu toggle control
    #[serde(default = "default_toggle_id")]
    pub toggle_id: String,
    /// Id of the side drawer
    #[serde(default = "default_drawer_id")]
    pub drawer_id: String,
    #[serde(default = "default_link_selector")]
    pub link_selector: String,
    /// Attribute on nav links naming the section they point at
    #[serde(default = "default_section_attribute")]
    pub section_attribute: String,
    #[serde(default = "default_section_selector")]
    pub section_selector: String,
    #[serde(default = "default_open_class")]
    pub open_class: String,
    #[serde(default = "default_active_class")]
    pub toggle_active_class: String,
    /// Body class that locks page scrolling while the drawer is open
    #[serde(default = "default_body_lock_class")]
    pub body_lock_class: String,
    #[serde(default = "default_active_class")]
    pub active_link_class: String,
    /// Sections count as current while they overlap the 20%-80% band
    #[serde(default = "default_section_observer")]
    pub observer: ObserverSpec,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            toggle_id: default_toggle_id(),
            drawer_id: default_drawer_id(),
            link_selector: default_link_selector(),
            section_attribute: default_section_attribute(),
            section_selector: default_section_selector(),
            open_class: default_open_class(),
            toggle_active_class: default_active_class(),
            body_lock_class: default_body_lock_class(),
            active_link_class: default_active_class(),
            observer: default_section_observer(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterConfig {
    #[serde(default = "default_counter_selector")]
    pub selector: String,
    /// Attribute holding the integer to count up to
    #[serde(default = "default_target_attribute")]
    pub target_attribute: String,
    /// Number of frames the count-up is spread over
    #[serde(default = "default_counter_steps")]
    pub steps: u32,
    #[serde(default = "default_animated_class")]
    pub animated_class: String,
    #[serde(default = "default_plain_observer")]
    pub observer: ObserverSpec,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            selector: default_counter_selector(),
            target_attribute: default_target_attribute(),
            steps: default_counter_steps(),
            animated_class: default_animated_class(),
            observer: default_plain_observer(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    #[serde(default = "default_form_id")]
    pub form_id: String,
    #[serde(default = "default_submit_selector")]
    pub submit_selector: String,
    #[serde(default = "default_sending_label")]
    pub sending_label: String,
    #[serde(default = "default_success_label")]
    pub success_label: String,
    #[serde(default = "default_error_label")]
    pub error_label: String,
    #[serde(default = "default_success_background")]
    pub success_background: String,
    #[serde(default = "default_error_background")]
    pub error_background: String,
    /// Delay before the submit control returns to idle
    #[serde(default = "default_revert_delay")]
    pub revert_delay_ms: u64,
    /// Network delay of the simulated submitter
    #[serde(default = "default_simulated_delay")]
    pub simulated_delay_ms: u64,
    /// Endpoint for the HTTP submitter; the simulation is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            form_id: default_form_id(),
            submit_selector: default_submit_selector(),
            sending_label: default_sending_label(),
            success_label: default_success_label(),
            error_label: default_error_label(),
            success_background: default_success_background(),
            error_background: default_error_background(),
            revert_delay_ms: default_revert_delay(),
            simulated_delay_ms: default_simulated_delay(),
            endpoint: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealConfig {
    #[serde(default = "default_reveal_selector")]
    pub selector: String,
    /// Delay added per position in an observation batch
    #[serde(default = "default_stagger")]
    pub stagger_ms: u64,
    /// Initial downward offset in pixels
    #[serde(default = "default_reveal_offset")]
    pub offset_px: f64,
    #[serde(default = "default_reveal_transition")]
    pub transition: String,
    #[serde(default = "default_reveal_observer")]
    pub observer: ObserverSpec,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            selector: default_reveal_selector(),
            stagger_ms: default_stagger(),
            offset_px: default_reveal_offset(),
            transition: default_reveal_transition(),
            observer: default_reveal_observer(),
        }
    }
}

/// How an in-page scroll is animated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollMode {
    /// Frame-driven animation using the configured easing
    #[default]
    Animated,
    /// Delegate to the host's `behavior: smooth`
    Native,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmoothScrollConfig {
    #[serde(default = "default_anchor_selector")]
    pub anchor_selector: String,
    /// Height of the fixed header kept clear above the target
    #[serde(default = "default_header_offset")]
    pub header_offset: f64,
    #[serde(default)]
    pub mode: ScrollMode,
    #[serde(default = "default_scroll_duration")]
    pub duration_ms: u64,
    #[serde(default)]
    pub easing: EasingType,
}

impl Default for SmoothScrollConfig {
    fn default() -> Self {
        Self {
            anchor_selector: default_anchor_selector(),
            header_offset: default_header_offset(),
            mode: ScrollMode::default(),
            duration_ms: default_scroll_duration(),
            easing: EasingType::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LazyImageConfig {
    #[serde(default = "default_lazy_selector")]
    pub selector: String,
    #[serde(default = "default_source_attribute")]
    pub source_attribute: String,
    /// Placeholder class removed once the real source is set
    #[serde(default = "default_lazy_class")]
    pub lazy_class: String,
    #[serde(default = "default_plain_observer")]
    pub observer: ObserverSpec,
}

impl Default for LazyImageConfig {
    fn default() -> Self {
        Self {
            selector: default_lazy_selector(),
            source_attribute: default_source_attribute(),
            lazy_class: default_lazy_class(),
            observer: default_plain_observer(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Click targets whose text is reported
    #[serde(default = "default_clickable_selector")]
    pub clickable_selector: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            clickable_selector: default_clickable_selector(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Inject static colours when CSS custom properties are unsupported
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_fallback_css")]
    pub css: String,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            css: default_fallback_css(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_progress_class() -> String {
    "scroll-progress".to_string()
}

fn default_progress_bar_class() -> String {
    "scroll-progress-bar".to_string()
}

fn default_parallax_selector() -> String {
    ".floating-elements".to_string()
}

fn default_parallax_speed() -> f64 {
    0.5
}

fn default_toggle_id() -> String {
    "mobileMenuToggle".to_string()
}

fn default_drawer_id() -> String {
    "sidenav".to_string()
}

fn default_link_selector() -> String {
    ".nav-link".to_string()
}

fn default_section_attribute() -> String {
    "data-section".to_string()
}

fn default_section_selector() -> String {
    "section[id]".to_string()
}

fn default_open_class() -> String {
    "open".to_string()
}

fn default_active_class() -> String {
    "active".to_string()
}

fn default_body_lock_class() -> String {
    "menu-open".to_string()
}

fn default_section_observer() -> ObserverSpec {
    ObserverSpec::new(0.0, "-20% 0px -20% 0px")
}

fn default_plain_observer() -> ObserverSpec {
    ObserverSpec::new(0.0, "0px")
}

fn default_counter_selector() -> String {
    ".stat-number".to_string()
}

fn default_target_attribute() -> String {
    "data-target".to_string()
}

fn default_counter_steps() -> u32 {
    100
}

fn default_animated_class() -> String {
    "animated".to_string()
}

fn default_form_id() -> String {
    "contactForm".to_string()
}

fn default_submit_selector() -> String {
    r#"button[type="submit"]"#.to_string()
}

fn default_sending_label() -> String {
    "Sending...".to_string()
}

fn default_success_label() -> String {
    "Message Sent!".to_string()
}

fn default_error_label() -> String {
    "Error - Try Again".to_string()
}

fn default_success_background() -> String {
    "var(--success-green)".to_string()
}

fn default_error_background() -> String {
    "#EF4444".to_string()
}

fn default_revert_delay() -> u64 {
    3000
}

fn default_simulated_delay() -> u64 {
    2000
}

fn default_reveal_selector() -> String {
    ".service-card, .client-card, .benefit-item".to_string()
}

fn default_stagger() -> u64 {
    100
}

fn default_reveal_offset() -> f64 {
    30.0
}

fn default_reveal_transition() -> String {
    "opacity 0.6s ease, transform 0.6s ease".to_string()
}

fn default_reveal_observer() -> ObserverSpec {
    ObserverSpec::new(0.1, "0px 0px -50px 0px")
}

fn default_anchor_selector() -> String {
    r##"a[href^="#"]"##.to_string()
}

fn default_header_offset() -> f64 {
    80.0
}

fn default_scroll_duration() -> u64 {
    600
}

fn default_lazy_selector() -> String {
    "img[data-src]".to_string()
}

fn default_source_attribute() -> String {
    "data-src".to_string()
}

fn default_lazy_class() -> String {
    "lazy".to_string()
}

fn default_clickable_selector() -> String {
    "button, a, .clickable".to_string()
}

/// Absolute URLs and same-origin paths such as `/api/contact` are accepted
fn check_endpoint(endpoint: &str) -> crate::Result<()> {
    match url::Url::parse(endpoint) {
        Ok(_) => Ok(()),
        Err(url::ParseError::RelativeUrlWithoutBase) if endpoint.starts_with('/') => {
            url::Url::parse("http://localhost/")?.join(endpoint)?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn default_fallback_css() -> String {
    ".btn-primary { background: #F97316; }\n.nav-link:hover { background: #F97316; }\n".to_string()
}

impl SiteConfig {
    /// Parse a TOML document; missing sections and fields take their defaults
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let config: SiteConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Render the configuration as pretty TOML
    pub fn to_toml_string(&self) -> crate::Result<String> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Check every selector, observer option, and the endpoint URL
    pub fn validate(&self) -> crate::Result<()> {
        for selector in [
            &self.scroll.parallax_selector,
            &self.navigation.link_selector,
            &self.navigation.section_selector,
            &self.counters.selector,
            &self.form.submit_selector,
            &self.reveal.selector,
            &self.smooth_scroll.anchor_selector,
            &self.lazy_images.selector,
            &self.monitor.clickable_selector,
        ] {
            Selector::parse(selector)?;
        }

        for observer in [
            &self.navigation.observer,
            &self.counters.observer,
            &self.reveal.observer,
            &self.lazy_images.observer,
        ] {
            observer.resolve()?;
        }

        if self.counters.steps == 0 {
            return Err(crate::Error::Config("counters.steps must be at least 1".to_string()));
        }

        if let Some(endpoint) = &self.form.endpoint {
            check_endpoint(endpoint)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_site_markup() {
        let config = SiteConfig::default();
        assert_eq!(config.scroll.parallax_speed, 0.5);
        assert_eq!(config.navigation.toggle_id, "mobileMenuToggle");
        assert_eq!(config.form.revert_delay_ms, 3000);
        assert_eq!(config.form.simulated_delay_ms, 2000);
        assert_eq!(config.reveal.observer.threshold, 0.1);
        assert_eq!(config.smooth_scroll.header_offset, 80.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = SiteConfig::from_toml_str(
            r#"
            [form]
            revert_delay_ms = 1500
            endpoint = "https://example.com/contact"

            [smooth_scroll]
            mode = "native"
            easing = "quintic"
            "#,
        )
        .unwrap();
        assert_eq!(config.form.revert_delay_ms, 1500);
        assert_eq!(config.form.sending_label, "Sending...");
        assert_eq!(config.smooth_scroll.mode, ScrollMode::Native);
        assert_eq!(config.smooth_scroll.easing, EasingType::Quintic);
        assert_eq!(config.counters.steps, 100);
    }

    #[test]
    fn test_rejects_bad_selector_and_endpoint() {
        let err = SiteConfig::from_toml_str("[reveal]\nselector = \"main .card\"\n");
        assert!(matches!(err, Err(crate::Error::Selector { .. })));

        let err = SiteConfig::from_toml_str("[form]\nendpoint = \"not a url\"\n");
        assert!(matches!(err, Err(crate::Error::InvalidEndpoint(_))));

        let err = SiteConfig::from_toml_str("[counters]\nsteps = 0\n");
        assert!(matches!(err, Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_same_origin_endpoint_is_accepted() {
        let config = SiteConfig::from_toml_str("[form]\nendpoint = \"/api/contact\"\n").unwrap();
        assert_eq!(config.form.endpoint.as_deref(), Some("/api/contact"));

        let err = SiteConfig::from_toml_str("[form]\nendpoint = \"api/contact\"\n");
        assert!(matches!(err, Err(crate::Error::InvalidEndpoint(_))));
    }

    #[test]
    fn test_toml_round_trip_preserves_observer_margins() {
        let text = SiteConfig::default().to_toml_string().unwrap();
        let parsed = SiteConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.navigation.observer.root_margin, "-20% 0px -20% 0px");
    }
}
