pub mod document;
pub mod loaders;
pub mod question;

pub use document::Document;
pub use loaders::load_document_from_file;
pub use question::{
    Blank, Difficulty, FillInTheBlankQuestion, MatchingPair, MatchingQuestion,
    MultipleChoiceQuestion, QuestionMeta, QuestionSet, QuestionType,
};
