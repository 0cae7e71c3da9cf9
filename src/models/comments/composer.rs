use std::sync::Arc;

use crate::auth::validate::{validate_max_chars, validate_required};
use crate::clock::Clock;
use crate::errors::AppError;
use crate::ids;
use super::types::*;

pub const MAX_SECTION_CHARS: usize = 2000;
pub const MAX_TITLE_CHARS: usize = 256;

pub const REJECTION_PLACEHOLDER: &str = "After careful review of this proposal, we have determined that it does not meet the required standards for approval. The following concerns have been identified:\n\n1. [Specify main concern]\n2. [Additional concerns if any]\n\nWe recommend that the proponent address these issues before resubmission.";

/// Builder for a [`StructuredComments`] document.
///
/// Holds no persistence; the engine embeds the finished document into the
/// decision it commits.
pub struct CommentComposer {
    author: String,
    clock: Arc<dyn Clock>,
    doc: StructuredComments,
}

impl CommentComposer {
    pub fn new(author: &str, clock: Arc<dyn Clock>) -> Self {
        let fixed = |key: SectionKey| CommentSection {
            id: key.id().to_string(),
            title: key.title().to_string(),
            content: String::new(),
            last_modified: None,
            author: author.to_string(),
        };
        let doc = StructuredComments {
            objectives: fixed(SectionKey::Objectives),
            methodology: fixed(SectionKey::Methodology),
            budget: fixed(SectionKey::Budget),
            timeline: fixed(SectionKey::Timeline),
            overall: fixed(SectionKey::Overall),
            additional: Vec::new(),
        };
        CommentComposer {
            author: author.to_string(),
            clock,
            doc,
        }
    }

    /// Start from a client draft.
    pub fn from_input(
        author: &str,
        clock: Arc<dyn Clock>,
        input: &CommentsInput,
    ) -> Result<Self, AppError> {
        let mut composer = CommentComposer::new(author, clock);
        for key in SectionKey::ALL {
            if let Some(text) = input.get(key) {
                composer.set_section_content(key, text)?;
            }
        }
        for section in &input.additional {
            let id = composer.add_additional_section(&section.title)?;
            composer.set_additional_content(&id, &section.content)?;
        }
        Ok(composer)
    }

    pub fn set_section_content(&mut self, key: SectionKey, text: &str) -> Result<(), AppError> {
        check_content(key.title(), text)?;
        let now = self.clock.now();
        let section = self.doc.section_mut(key);
        section.content = text.to_string();
        section.last_modified = Some(now);
        Ok(())
    }

    /// Append a new section and return its generated id.
    pub fn add_additional_section(&mut self, title: &str) -> Result<String, AppError> {
        if let Some(msg) = validate_required(title, "Section title", MAX_TITLE_CHARS) {
            return Err(AppError::Validation(msg));
        }
        let id = ids::generate("additional");
        self.doc.additional.push(CommentSection {
            id: id.clone(),
            title: title.trim().to_string(),
            content: String::new(),
            last_modified: Some(self.clock.now()),
            author: self.author.clone(),
        });
        Ok(id)
    }

    pub fn set_additional_content(&mut self, id: &str, text: &str) -> Result<(), AppError> {
        let now = self.clock.now();
        let section = self
            .doc
            .additional
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| AppError::Validation(format!("Unknown comment section '{id}'")))?;
        check_content(&section.title, text)?;
        section.content = text.to_string();
        section.last_modified = Some(now);
        Ok(())
    }

    /// Remove an additional section by id. Other sections keep their ids.
    pub fn remove_additional_section(&mut self, id: &str) -> bool {
        let before = self.doc.additional.len();
        self.doc.additional.retain(|s| s.id != id);
        self.doc.additional.len() != before
    }

    /// Fill a blank rejection comment (the objectives section) with the
    /// canonical placeholder. Returns whether anything was written.
    pub fn apply_rejection_placeholder(&mut self) -> bool {
        if !self.doc.objectives.is_blank() {
            return false;
        }
        self.doc.objectives.content = REJECTION_PLACEHOLDER.to_string();
        self.doc.objectives.last_modified = Some(self.clock.now());
        true
    }

    pub fn document(&self) -> &StructuredComments {
        &self.doc
    }

    pub fn finish(self) -> StructuredComments {
        self.doc
    }
}

fn check_content(title: &str, text: &str) -> Result<(), AppError> {
    match validate_max_chars(text, title, MAX_SECTION_CHARS) {
        Some(msg) => Err(AppError::Validation(msg)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{TimeZone, Utc};

    fn composer() -> (Arc<FixedClock>, CommentComposer) {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()));
        let c = CommentComposer::new("Staff One", clock.clone());
        (clock, c)
    }

    #[test]
    fn setting_content_stamps_last_modified() {
        let (clock, mut c) = composer();
        clock.advance(chrono::Duration::minutes(5));
        c.set_section_content(SectionKey::Budget, "Trim equipment line").unwrap();
        let doc = c.finish();
        assert_eq!(doc.budget.content, "Trim equipment line");
        assert_eq!(doc.budget.last_modified, Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 5, 0).unwrap()));
        assert_eq!(doc.budget.id, "budget");
        assert!(doc.methodology.last_modified.is_none());
    }

    #[test]
    fn removing_middle_section_keeps_other_ids() {
        let (_, mut c) = composer();
        let a = c.add_additional_section("Ethics").unwrap();
        let b = c.add_additional_section("Data plan").unwrap();
        let d = c.add_additional_section("Partners").unwrap();
        c.set_additional_content(&d, "Add MOA").unwrap();
        assert!(c.remove_additional_section(&b));
        assert!(!c.remove_additional_section(&b));

        let doc = c.finish();
        let ids: Vec<&str> = doc.additional.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, [a.as_str(), d.as_str()]);
        assert_eq!(doc.additional_section(&d).unwrap().content, "Add MOA");
        assert_eq!(doc.additional_section(&d).unwrap().title, "Partners");
    }

    #[test]
    fn placeholder_only_fills_blank_objectives() {
        let (_, mut c) = composer();
        assert!(c.apply_rejection_placeholder());
        assert!(!c.apply_rejection_placeholder());
        assert_eq!(c.document().objectives.content, REJECTION_PLACEHOLDER);

        let (_, mut c) = composer();
        c.set_section_content(SectionKey::Objectives, "Out of scope for this call").unwrap();
        assert!(!c.apply_rejection_placeholder());
        assert_eq!(c.document().objectives.content, "Out of scope for this call");
    }

    #[test]
    fn oversized_content_is_rejected() {
        let (_, mut c) = composer();
        let long = "x".repeat(MAX_SECTION_CHARS + 1);
        assert!(matches!(
            c.set_section_content(SectionKey::Overall, &long),
            Err(AppError::Validation(_))
        ));
        assert!(c.add_additional_section("   ").is_err());
    }

    #[test]
    fn from_input_builds_fixed_and_additional_sections() {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()));
        let input = CommentsInput {
            methodology: Some("Clarify sampling".into()),
            additional: vec![AdditionalSectionInput { title: "Ethics".into(), content: "IRB letter".into() }],
            ..Default::default()
        };
        let doc = CommentComposer::from_input("Staff One", clock, &input).unwrap().finish();
        assert_eq!(doc.methodology.content, "Clarify sampling");
        assert_eq!(doc.additional.len(), 1);
        assert!(doc.additional[0].id.starts_with("additional-"));
        assert_eq!(doc.additional[0].author, "Staff One");
        assert!(!doc.is_blank());
    }
}
