use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The five fixed feedback sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKey {
    Objectives,
    Methodology,
    Budget,
    Timeline,
    Overall,
}

impl SectionKey {
    pub const ALL: [SectionKey; 5] = [
        SectionKey::Objectives,
        SectionKey::Methodology,
        SectionKey::Budget,
        SectionKey::Timeline,
        SectionKey::Overall,
    ];

    /// Stable id of the fixed section.
    pub fn id(&self) -> &'static str {
        match self {
            SectionKey::Objectives => "objectives",
            SectionKey::Methodology => "methodology",
            SectionKey::Budget => "budget",
            SectionKey::Timeline => "timeline",
            SectionKey::Overall => "overall",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SectionKey::Objectives => "Objectives",
            SectionKey::Methodology => "Methodology",
            SectionKey::Budget => "Budget",
            SectionKey::Timeline => "Timeline",
            SectionKey::Overall => "Overall",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSection {
    pub id: String,
    pub title: String,
    pub content: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub author: String,
}

impl CommentSection {
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Multi-section feedback attached to a decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredComments {
    pub objectives: CommentSection,
    pub methodology: CommentSection,
    pub budget: CommentSection,
    pub timeline: CommentSection,
    pub overall: CommentSection,
    #[serde(default)]
    pub additional: Vec<CommentSection>,
}

impl StructuredComments {
    pub fn section(&self, key: SectionKey) -> &CommentSection {
        match key {
            SectionKey::Objectives => &self.objectives,
            SectionKey::Methodology => &self.methodology,
            SectionKey::Budget => &self.budget,
            SectionKey::Timeline => &self.timeline,
            SectionKey::Overall => &self.overall,
        }
    }

    pub fn section_mut(&mut self, key: SectionKey) -> &mut CommentSection {
        match key {
            SectionKey::Objectives => &mut self.objectives,
            SectionKey::Methodology => &mut self.methodology,
            SectionKey::Budget => &mut self.budget,
            SectionKey::Timeline => &mut self.timeline,
            SectionKey::Overall => &mut self.overall,
        }
    }

    pub fn additional_section(&self, id: &str) -> Option<&CommentSection> {
        self.additional.iter().find(|s| s.id == id)
    }

    pub fn is_blank(&self) -> bool {
        SectionKey::ALL.iter().all(|k| self.section(*k).is_blank())
            && self.additional.iter().all(CommentSection::is_blank)
    }
}

/// Comment draft as sent by the client. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentsInput {
    pub objectives: Option<String>,
    pub methodology: Option<String>,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub overall: Option<String>,
    #[serde(default)]
    pub additional: Vec<AdditionalSectionInput>,
}

impl CommentsInput {
    pub fn get(&self, key: SectionKey) -> Option<&str> {
        match key {
            SectionKey::Objectives => self.objectives.as_deref(),
            SectionKey::Methodology => self.methodology.as_deref(),
            SectionKey::Budget => self.budget.as_deref(),
            SectionKey::Timeline => self.timeline.as_deref(),
            SectionKey::Overall => self.overall.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AdditionalSectionInput {
    pub title: String,
    #[serde(default)]
    pub content: String,
}
