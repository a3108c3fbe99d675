//! Page load timing and interaction logging

use crate::config::MonitorConfig;
use crate::dom::{ElementId, Host};
use crate::event::{NavigationTiming, Report};
use crate::selector::Selector;
use crate::Result;

pub struct Monitor {
    enabled: bool,
    clickable: Selector,
}

impl Monitor {
    pub fn new(config: &MonitorConfig) -> Result<Self> {
        Ok(Self {
            enabled: config.enabled,
            clickable: Selector::parse(&config.clickable_selector)?,
        })
    }

    pub fn on_load(&self, timing: NavigationTiming, host: &mut dyn Host) {
        if !self.enabled {
            return;
        }
        let duration_ms = timing.load_event_end - timing.load_event_start;
        if duration_ms < 0.0 {
            tracing::debug!(?timing, "Load timing incomplete, not reported");
            return;
        }
        host.report(Report::PageLoad { duration_ms });
    }

    pub fn on_click(&self, target: ElementId, host: &mut dyn Host) {
        if !self.enabled {
            return;
        }
        if let Some(el) = host.closest(target, &self.clickable) {
            let label = host.text_content(el).trim().to_string();
            host.report(Report::Interaction { label });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementBuilder, HeadlessPage};

    #[test]
    fn test_reports_load_time_and_clicks() {
        let mut page = HeadlessPage::new(800.0);
        let button = page.append(page.body_id(), ElementBuilder::new("button").html("  <span>Get a Quote</span>\n"));
        let icon = page.append(button, ElementBuilder::new("i"));
        let text = page.append(page.body_id(), ElementBuilder::new("p").html("Plain copy"));

        let monitor = Monitor::new(&MonitorConfig::default()).unwrap();
        monitor.on_load(
            NavigationTiming {
                load_event_start: 1200.0,
                load_event_end: 1234.5,
            },
            &mut page,
        );
        monitor.on_click(icon, &mut page);
        monitor.on_click(text, &mut page);

        assert_eq!(
            page.reports(),
            &[
                Report::PageLoad { duration_ms: 34.5 },
                Report::Interaction {
                    label: "Get a Quote".to_string()
                },
            ]
        );
        assert_eq!(page.reports()[0].to_string(), "Page Load Time: 34.5");
    }

    #[test]
    fn test_disabled_monitor_is_silent() {
        let mut page = HeadlessPage::new(800.0);
        let link = page.append(page.body_id(), ElementBuilder::new("a").html("Home"));
        let config = MonitorConfig {
            enabled: false,
            ..Default::default()
        };
        let monitor = Monitor::new(&config).unwrap();
        monitor.on_load(NavigationTiming::default(), &mut page);
        monitor.on_click(link, &mut page);
        assert!(page.reports().is_empty());
    }
}
