//! Contact Form - Client-side validation only
//!
//! Submitting reads the `value` of the name, email and message fields.
//! The visitor is told about missing fields or a malformed address;
//! otherwise they get a thank-you and the fields are cleared. Nothing is
//! sent anywhere.

use std::rc::Rc;

use tracing::debug;

use crate::error::FormError;
use crate::host::{Document, Window};
use crate::types::ElementId;

pub const SENT_MESSAGE: &str = "Thank you! Your message has been sent.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactFields {
    pub form: ElementId,
    pub name: ElementId,
    pub email: ElementId,
    pub message: ElementId,
}

impl Default for ContactFields {
    fn default() -> Self {
        Self {
            form: ElementId::new("contactForm"),
            name: ElementId::new("name"),
            email: ElementId::new("email"),
            message: ElementId::new("message"),
        }
    }
}

// =============================================================================
// SUBMISSION
// =============================================================================

/// Field values as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactSubmission {
    /// Whitespace-only counts as empty. Missing fields are reported before
    /// the address is checked.
    pub fn validate(&self) -> Result<(), FormError> {
        let missing: Vec<&'static str> = [
            ("name", &self.name),
            ("email", &self.email),
            ("message", &self.message),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if !missing.is_empty() {
            return Err(FormError::MissingFields(missing));
        }
        if !is_plausible_email(self.email.trim()) {
            return Err(FormError::InvalidEmail);
        }
        Ok(())
    }
}

/// `local@domain.tld` with no whitespace and exactly one `@`.
pub fn is_plausible_email(address: &str) -> bool {
    if address.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty() && !domain.starts_with('.'),
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Sent,
    Rejected(FormError),
}

// =============================================================================
// FORM
// =============================================================================

pub struct ContactForm {
    document: Rc<dyn Document>,
    window: Rc<dyn Window>,
    fields: ContactFields,
}

impl ContactForm {
    /// `None` when the form is not on the page.
    pub fn mount(
        document: Rc<dyn Document>,
        window: Rc<dyn Window>,
        fields: ContactFields,
    ) -> Option<Self> {
        if !document.contains(&fields.form) {
            debug!(form = %fields.form, "contact form missing");
            return None;
        }
        Some(Self {
            document,
            window,
            fields,
        })
    }

    pub fn is_form(&self, id: &ElementId) -> bool {
        *id == self.fields.form
    }

    /// Current field values. Absent fields read as empty.
    pub fn read(&self) -> ContactSubmission {
        let value = |id: &ElementId| self.document.attribute(id, "value").unwrap_or_default();
        ContactSubmission {
            name: value(&self.fields.name),
            email: value(&self.fields.email),
            message: value(&self.fields.message),
        }
    }

    /// Validate, tell the visitor the result, and clear the form on success.
    pub fn submit(&self) -> SubmitOutcome {
        match self.read().validate() {
            Ok(()) => {
                self.window.notify(SENT_MESSAGE);
                for id in [&self.fields.name, &self.fields.email, &self.fields.message] {
                    if self.document.contains(id) {
                        self.document.set_attribute(id, "value", "");
                    }
                }
                debug!("contact form accepted");
                SubmitOutcome::Sent
            }
            Err(err) => {
                self.window.notify(&err.to_string());
                debug!(error = ?err, "contact form rejected");
                SubmitOutcome::Rejected(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryPage;

    fn setup() -> (Rc<MemoryPage>, ContactForm) {
        let page = Rc::new(MemoryPage::new(800.0));
        page.element("contactForm");
        page.element("name").attr("value", "Ada");
        page.element("email").attr("value", "ada@example.com");
        page.element("message").attr("value", "Hello");
        let form = ContactForm::mount(page.clone(), page.clone(), ContactFields::default()).unwrap();
        (page, form)
    }

    #[test]
    fn test_valid_submission_clears_fields() {
        let (page, form) = setup();

        assert_eq!(form.submit(), SubmitOutcome::Sent);
        assert_eq!(page.alerts(), vec![SENT_MESSAGE]);
        assert_eq!(form.read(), ContactSubmission::default());
    }

    #[test]
    fn test_missing_fields_reported() {
        let (page, form) = setup();
        page.set_attribute(&"name".into(), "value", "   ");
        page.set_attribute(&"message".into(), "value", "");

        assert_eq!(
            form.submit(),
            SubmitOutcome::Rejected(FormError::MissingFields(vec!["name", "message"]))
        );
        assert_eq!(page.alerts(), vec!["Please fill all required fields."]);
        assert_eq!(form.read().email, "ada@example.com");
    }

    #[test]
    fn test_invalid_email() {
        let (page, form) = setup();
        page.set_attribute(&"email".into(), "value", "ada@example");

        assert_eq!(form.submit(), SubmitOutcome::Rejected(FormError::InvalidEmail));
        assert_eq!(page.alerts(), vec!["Please enter a valid email address."]);
    }

    #[test]
    fn test_email_plausibility() {
        assert!(is_plausible_email("a@b.co"));
        assert!(is_plausible_email("first.last@mail.example.org"));
        assert!(!is_plausible_email("@b.co"));
        assert!(!is_plausible_email("a@@b.co"));
        assert!(!is_plausible_email("a@.co"));
        assert!(!is_plausible_email("a@b."));
        assert!(!is_plausible_email("a b@c.de"));
        assert!(!is_plausible_email("plain"));
    }

    #[test]
    fn test_missing_form() {
        let page = Rc::new(MemoryPage::new(800.0));
        assert!(ContactForm::mount(page.clone(), page, ContactFields::default()).is_none());
    }
}
