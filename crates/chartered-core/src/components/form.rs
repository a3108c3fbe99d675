//! Contact form submission with transient sending/success/error feedback
//!
//! The submit control moves through `Idle -> Sending -> Success | Error -> Idle`.
//! It is disabled from the moment sending starts until it is back to idle,
//! so a second submission can never overlap the first.

use tracing::{debug, info, warn};

use crate::config::FormConfig;
use crate::dom::{ElementId, Host};
use crate::event::{EventOutcome, TimerTask};
use crate::selector::Selector;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitPhase {
    #[default]
    Idle,
    Sending,
    Success,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub phase: SubmitPhase,
    pub control_disabled: bool,
    /// Markup of the submit control before the first submission
    pub original_label: Option<String>,
    pub submissions: u32,
    pub failures: u32,
}

pub struct ContactForm {
    config: FormConfig,
    submit_selector: Selector,
    form: Option<ElementId>,
    control: Option<ElementId>,
    state: FormState,
}

fn label(text: &str) -> String {
    format!("<span>{}</span>", text)
}

impl ContactForm {
    pub fn new(config: &FormConfig) -> Result<Self> {
        Ok(Self {
            submit_selector: Selector::parse(&config.submit_selector)?,
            config: config.clone(),
            form: None,
            control: None,
            state: FormState::default(),
        })
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn form(&self) -> Option<ElementId> {
        self.form
    }

    pub fn control(&self) -> Option<ElementId> {
        self.control
    }

    pub fn setup(&mut self, host: &mut dyn Host) {
        self.form = host.element_by_id(&self.config.form_id);
        self.control = self
            .form
            .and_then(|form| host.query_within(form, &self.submit_selector));
        if self.form.is_none() {
            debug!("No contact form on this page");
        }
    }

    pub fn on_submit(&mut self, form: ElementId, host: &mut dyn Host, outcome: &mut EventOutcome) {
        if self.form != Some(form) {
            return;
        }
        outcome.prevent_default();

        let Some(control) = self.control else {
            warn!("Contact form has no submit control, submission ignored");
            return;
        };
        if self.state.phase != SubmitPhase::Idle {
            debug!(phase = ?self.state.phase, "Submission already in progress");
            return;
        }

        self.state.original_label = Some(host.inner_html(control));
        host.set_inner_html(control, &label(&self.config.sending_label));
        host.set_disabled(control, true);
        self.state.control_disabled = true;
        self.state.phase = SubmitPhase::Sending;
        self.state.submissions += 1;

        let data = host.form_data(form);
        debug!(fields = data.fields.len(), "Contact form submission started");
        host.begin_submission(form, data);
    }

    pub fn on_settled(&mut self, form: ElementId, outcome: &std::result::Result<(), Error>, host: &mut dyn Host) {
        if self.form != Some(form) || self.state.phase != SubmitPhase::Sending {
            return;
        }
        let Some(control) = self.control else {
            return;
        };

        match outcome {
            Ok(()) => {
                info!("Contact form submitted");
                host.set_inner_html(control, &label(&self.config.success_label));
                host.set_style(control, "background", &self.config.success_background);
                host.reset_form(form);
                self.state.phase = SubmitPhase::Success;
            }
            Err(e) => {
                warn!("Contact form submission failed: {}", e);
                host.set_inner_html(control, &label(&self.config.error_label));
                host.set_style(control, "background", &self.config.error_background);
                self.state.phase = SubmitPhase::Error;
                self.state.failures += 1;
            }
        }
        host.set_timeout(self.config.revert_delay_ms, TimerTask::RevertSubmit(form));
    }

    pub fn on_revert(&mut self, form: ElementId, host: &mut dyn Host) {
        if self.form != Some(form) {
            return;
        }
        let Some(control) = self.control else {
            return;
        };
        if let Some(original) = &self.state.original_label {
            host.set_inner_html(control, original);
        }
        host.set_disabled(control, false);
        host.set_style(control, "background", "");
        self.state.control_disabled = false;
        self.state.phase = SubmitPhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementBuilder, HeadlessPage};
    use crate::event::PageEvent;

    struct Fixture {
        page: HeadlessPage,
        form: ContactForm,
        form_el: ElementId,
        field: ElementId,
        button: ElementId,
    }

    fn fixture() -> Fixture {
        let mut page = HeadlessPage::new(800.0);
        let form_el = page.append(page.body_id(), ElementBuilder::new("form").id("contactForm"));
        let field = page.append(form_el, ElementBuilder::new("input").attr("name", "message").value(""));
        let button = page.append(
            form_el,
            ElementBuilder::new("button").attr("type", "submit").html("<span>Send Message</span>"),
        );
        let mut form = ContactForm::new(&FormConfig::default()).unwrap();
        form.setup(&mut page);
        Fixture {
            page,
            form,
            form_el,
            field,
            button,
        }
    }

    fn submit(f: &mut Fixture) -> EventOutcome {
        let mut outcome = EventOutcome::default();
        f.form.on_submit(f.form_el, &mut f.page, &mut outcome);
        outcome
    }

    fn fire_timers(f: &mut Fixture, ms: f64) {
        f.page.advance_to(f.page.now() + ms);
        for event in f.page.take_due() {
            if let PageEvent::Timer(TimerTask::RevertSubmit(form)) = event {
                f.form.on_revert(form, &mut f.page);
            }
        }
    }

    #[test]
    fn test_submit_enters_sending_and_hands_off_data() {
        let mut f = fixture();
        f.page.set_value(f.field, "Hello");
        let outcome = submit(&mut f);

        assert!(outcome.default_prevented);
        assert_eq!(f.form.state().phase, SubmitPhase::Sending);
        assert!(f.page.is_disabled(f.button));
        assert_eq!(f.page.text_content(f.button), "Sending...");

        let submissions = f.page.take_submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].1.get("message"), Some("Hello"));
    }

    #[test]
    fn test_success_clears_fields_then_reverts() {
        let mut f = fixture();
        f.page.set_value(f.field, "Hello");
        submit(&mut f);
        f.form.on_settled(f.form_el, &Ok(()), &mut f.page);

        assert_eq!(f.form.state().phase, SubmitPhase::Success);
        assert_eq!(f.page.text_content(f.button), "Message Sent!");
        assert_eq!(f.page.style(f.button, "background"), Some("var(--success-green)"));
        assert_eq!(f.page.value(f.field), Some(""));
        assert!(f.page.is_disabled(f.button));

        fire_timers(&mut f, 2999.0);
        assert_eq!(f.form.state().phase, SubmitPhase::Success);

        fire_timers(&mut f, 1.0);
        assert_eq!(f.form.state().phase, SubmitPhase::Idle);
        assert_eq!(f.page.inner_html(f.button), "<span>Send Message</span>");
        assert!(!f.page.is_disabled(f.button));
        assert_eq!(f.page.style(f.button, "background"), None);
    }

    #[test]
    fn test_rejection_shows_error_then_reverts() {
        let mut f = fixture();
        f.page.set_value(f.field, "Hello");
        submit(&mut f);
        let failure = Err(Error::Submission("offline".to_string()));
        f.form.on_settled(f.form_el, &failure, &mut f.page);

        assert_eq!(f.form.state().phase, SubmitPhase::Error);
        assert_eq!(f.page.text_content(f.button), "Error - Try Again");
        assert_eq!(f.page.style(f.button, "background"), Some("#EF4444"));
        assert_eq!(f.page.value(f.field), Some("Hello"));
        assert!(f.page.is_disabled(f.button));

        fire_timers(&mut f, 3000.0);
        assert_eq!(f.form.state().phase, SubmitPhase::Idle);
        assert_eq!(f.form.state().failures, 1);
        assert!(!f.page.is_disabled(f.button));
    }

    #[test]
    fn test_revert_restores_label_current_at_submit() {
        let mut f = fixture();
        submit(&mut f);
        f.form.on_settled(f.form_el, &Ok(()), &mut f.page);
        fire_timers(&mut f, 3000.0);

        f.page.set_inner_html(f.button, "<span>Book a Call</span>");
        submit(&mut f);
        f.form.on_settled(f.form_el, &Ok(()), &mut f.page);
        fire_timers(&mut f, 3000.0);

        assert_eq!(f.form.state().phase, SubmitPhase::Idle);
        assert_eq!(f.page.inner_html(f.button), "<span>Book a Call</span>");
    }

    #[test]
    fn test_resubmit_while_sending_is_ignored() {
        let mut f = fixture();
        submit(&mut f);
        let outcome = submit(&mut f);

        assert!(outcome.default_prevented);
        assert_eq!(f.form.state().submissions, 1);
        assert_eq!(f.page.take_submissions().len(), 1);
    }

    #[test]
    fn test_other_forms_are_left_alone() {
        let mut f = fixture();
        let search = f.page.append(f.page.body_id(), ElementBuilder::new("form").id("search"));
        let mut outcome = EventOutcome::default();
        f.form.on_submit(search, &mut f.page, &mut outcome);
        assert!(!outcome.default_prevented);
        assert_eq!(f.form.state().phase, SubmitPhase::Idle);
    }
}
