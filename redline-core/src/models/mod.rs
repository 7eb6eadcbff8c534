pub mod category;
pub mod flag;
pub mod record;
pub mod score;

pub use category::Category;
pub use flag::CategoryFlagSet;
pub use record::{
    parse_calendar_date, Assessment, CategoryMatch, ContentRef, GeneratedImage, ModerationRecord,
    RecordId, ScoredAssessment,
};
pub use score::{CategoryScoreSet, Score};
