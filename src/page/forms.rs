//! Client-side validation of `form[data-validate]` forms.

use anyhow::Result;
use ego_tree::NodeId;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::dom::{escape_html, Document};

/// Delay after which the success alert is removed.
pub const SUCCESS_ALERT_MS: u64 = 5000;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^[\d\s\-+()]{10,}$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: NodeId,
    pub message: String,
}

/// Value of an `input`, `textarea` or `select` element.
pub fn field_value(doc: &Document, field: NodeId) -> String {
    match doc.tag_name(field) {
        Some("textarea") => doc.text(field),
        Some("select") => {
            let options = doc.select_within(field, "option").unwrap_or_default();
            let selected = options.iter()
                .find(|o| doc.has_attr(**o, "selected"))
                .or_else(|| options.first());
            match selected {
                Some(option) => doc.attr(*option, "value")
                    .map(str::to_string)
                    .unwrap_or_else(|| doc.text(*option)),
                None => String::new(),
            }
        }
        _ => doc.attr(field, "value").unwrap_or_default().to_string(),
    }
}

pub fn set_field_value(doc: &mut Document, field: NodeId, value: &str) {
    match doc.tag_name(field) {
        Some("textarea") => doc.set_text(field, value),
        Some("select") => {
            for option in doc.select_within(field, "option").unwrap_or_default() {
                let option_value = doc.attr(option, "value")
                    .map(str::to_string)
                    .unwrap_or_else(|| doc.text(option));
                if option_value == value {
                    doc.set_attr(option, "selected", "");
                } else {
                    doc.remove_attr(option, "selected");
                }
            }
        }
        _ => doc.set_attr(field, "value", value),
    }
}

fn field_type(doc: &Document, field: NodeId) -> String {
    match doc.tag_name(field) {
        Some("input") => doc.attr(field, "type").unwrap_or("text").to_ascii_lowercase(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Text of the `.form-label` next to the field, without its first `*` (the required marker).
fn field_label(doc: &Document, field: NodeId) -> String {
    doc.parent(field)
        .and_then(|parent| doc.select_first_within(parent, ".form-label").ok().flatten())
        .map(|label| doc.text(label).replacen('*', "", 1).trim().to_string())
        .unwrap_or_else(|| "This field".to_string())
}

/// Checks a field without touching the document.
pub fn check_field(doc: &Document, field: NodeId) -> Option<FieldError> {
    let value = field_value(doc, field);
    let value = value.trim();
    let error = |message: String| Some(FieldError { field, message });

    if doc.has_attr(field, "required") && value.is_empty() {
        return error(format!("{} is required", field_label(doc, field)));
    }
    if value.is_empty() {
        return None;
    }

    match field_type(doc, field).as_str() {
        "email" if !EMAIL_RE.is_match(value) => {
            return error("Please enter a valid email address".to_string());
        }
        "tel" if !PHONE_RE.is_match(value) => {
            return error("Please enter a valid phone number".to_string());
        }
        _ => {}
    }

    let min_length = doc.attr(field, "minlength").and_then(|m| m.trim().parse::<usize>().ok()).unwrap_or(0);
    if min_length > 0 && value.chars().count() < min_length {
        return error(format!("Minimum {} characters required", min_length));
    }

    if let Some(pattern) = doc.attr(field, "pattern").filter(|p| !p.is_empty()) {
        match Regex::new(pattern) {
            Ok(re) if !re.is_match(value) => {
                let message = doc.attr(field, "data-error-message").unwrap_or("Invalid format");
                return error(message.to_string());
            }
            Ok(_) => {}
            Err(e) => debug!("Ignoring invalid pattern {:?}: {}", pattern, e),
        }
    }

    None
}

/// Validates forms and shows inline errors.
#[derive(Debug, Default)]
pub struct FormValidator;

impl FormValidator {
    pub fn forms(doc: &Document) -> Result<Vec<NodeId>> {
        doc.select_all("form[data-validate]")
    }

    pub fn fields(doc: &Document, form: NodeId) -> Result<Vec<NodeId>> {
        doc.select_within(form, "input, textarea, select")
    }

    /// Validates one field (on blur), showing or clearing its error.
    pub fn validate_field(&self, doc: &mut Document, field: NodeId) -> Result<bool> {
        self.clear_error(doc, field)?;
        match check_field(doc, field) {
            Some(err) => {
                self.show_error(doc, &err)?;
                Ok(false)
            }
            None => Ok(true),
        }
    }

    /// Validates every field of the form. All errors are shown, not only the first one.
    pub fn validate_form(&self, doc: &mut Document, form: NodeId) -> Result<Vec<FieldError>> {
        let mut errors = Vec::new();
        for field in Self::fields(doc, form)? {
            self.clear_error(doc, field)?;
            if let Some(err) = check_field(doc, field) {
                self.show_error(doc, &err)?;
                errors.push(err);
            }
        }
        Ok(errors)
    }

    /// A user typing in a field clears its error.
    pub fn input(&self, doc: &mut Document, field: NodeId, value: &str) -> Result<()> {
        set_field_value(doc, field, value);
        self.clear_error(doc, field)
    }

    /// Handles a submit. On success the form is reset and the id of the success alert is
    /// returned, for the caller to remove it after `SUCCESS_ALERT_MS`.
    pub fn submit(&self, doc: &mut Document, form: NodeId) -> Result<Result<NodeId, Vec<FieldError>>> {
        let errors = self.validate_form(doc, form)?;
        if !errors.is_empty() {
            return Ok(Err(errors));
        }

        let message = doc.attr(form, "data-success-message")
            .unwrap_or("Form submitted successfully!")
            .to_string();
        let alert = doc.prepend_html(form, &format!(r#"<div class="alert alert-success">{}</div>"#, escape_html(&message)));
        self.reset(doc, form)?;

        match alert.into_iter().next() {
            Some(alert) => Ok(Ok(alert)),
            None => anyhow::bail!("Failed to create success alert"),
        }
    }

    /// Clears field values. Buttons, hidden fields and choice inputs keep their value.
    pub fn reset(&self, doc: &mut Document, form: NodeId) -> Result<()> {
        for field in Self::fields(doc, form)? {
            match field_type(doc, field).as_str() {
                "submit" | "button" | "reset" | "hidden" | "checkbox" | "radio" | "select" => {}
                _ => set_field_value(doc, field, ""),
            }
        }
        Ok(())
    }

    fn show_error(&self, doc: &mut Document, err: &FieldError) -> Result<()> {
        let field = err.field;
        doc.add_class(field, "error");
        doc.set_attr(field, "aria-invalid", "true");

        let parent = match doc.parent(field) {
            Some(parent) => parent,
            None => return Ok(()),
        };
        let error_elt = match doc.select_first_within(parent, ".form-error")? {
            Some(elt) => Some(elt),
            None => doc.append_html(parent, r#"<span class="form-error" role="alert"></span>"#).into_iter().next(),
        };
        if let Some(elt) = error_elt {
            doc.set_text(elt, &err.message);
        }
        Ok(())
    }

    pub fn clear_error(&self, doc: &mut Document, field: NodeId) -> Result<()> {
        doc.remove_class(field, "error");
        doc.remove_attr(field, "aria-invalid");
        if let Some(parent) = doc.parent(field) {
            if let Some(elt) = doc.select_first_within(parent, ".form-error")? {
                doc.detach(elt);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const FORM: &str = r#"<html><body>
        <form data-validate data-success-message="Thanks!">
          <div><label class="form-label">Full Name *</label><input id="name" type="text" required></div>
          <div><label class="form-label">Email</label><input id="email" type="email" value="john@"></div>
          <div><input id="phone" type="tel" value="123"></div>
          <div><textarea id="msg" minlength="10">short</textarea></div>
          <div><input id="zip" pattern="^[0-9]{5}$" data-error-message="Use 5 digits" value="12a45"></div>
          <button type="submit">Send</button>
        </form></body></html>"#;

    fn messages(doc: &Document, errors: &[FieldError]) -> Vec<String> {
        errors.iter().map(|e| {
            assert!(doc.has_class(e.field, "error"));
            e.message.clone()
        }).collect()
    }

    #[test]
    fn test_error_messages() -> Result<()> {
        let mut doc = Document::parse(FORM);
        let form = doc.select_first("form")?.unwrap();
        let validator = FormValidator;

        let errors = validator.validate_form(&mut doc, form)?;
        assert_eq!(vec![
            "Full Name is required",
            "Please enter a valid email address",
            "Please enter a valid phone number",
            "Minimum 10 characters required",
            "Use 5 digits",
        ], messages(&doc, &errors));

        let alerts = doc.select_all(r#"span.form-error[role="alert"]"#)?;
        assert_eq!(5, alerts.len());

        // Re-validating doesn't duplicate error elements
        validator.validate_form(&mut doc, form)?;
        assert_eq!(5, doc.select_all(".form-error")?.len());
        Ok(())
    }

    #[test]
    fn test_only_the_required_marker_is_dropped() -> Result<()> {
        let doc = Document::parse(r#"<html><body><form data-validate>
            <div><label class="form-label">Rating (1-5*) *</label><input id="rating" required></div>
            </form></body></html>"#);
        let rating = doc.select_first("#rating")?.unwrap();

        let error = check_field(&doc, rating).unwrap();
        assert_eq!("Rating (1-5) * is required", error.message);
        Ok(())
    }

    #[test]
    fn test_typing_clears_error() -> Result<()> {
        let mut doc = Document::parse(FORM);
        let validator = FormValidator;
        let name = doc.select_first("#name")?.unwrap();

        assert!(!validator.validate_field(&mut doc, name)?);
        assert_eq!(Some("true"), doc.attr(name, "aria-invalid"));

        validator.input(&mut doc, name, "Jane")?;
        assert!(!doc.has_attr(name, "aria-invalid"));
        assert!(doc.select_first(".form-error")?.is_none());
        assert!(validator.validate_field(&mut doc, name)?);
        Ok(())
    }

    #[test]
    fn test_successful_submit() -> Result<()> {
        let mut doc = Document::parse(FORM);
        let form = doc.select_first("form")?.unwrap();
        let validator = FormValidator;

        for (id, value) in [("#name", "Jane Doe"), ("#email", "jane@example.com"), ("#phone", "+1 (555) 123-4567"),
                            ("#msg", "Please call me back"), ("#zip", "12345")] {
            let field = doc.select_first(id)?.unwrap();
            validator.input(&mut doc, field, value)?;
        }

        let alert = validator.submit(&mut doc, form)?.unwrap();
        assert_eq!("Thanks!", doc.text(alert));
        assert_eq!(doc.children(form).first(), Some(&alert));

        let name = doc.select_first("#name")?.unwrap();
        assert_eq!("", field_value(&doc, name));
        Ok(())
    }
}
