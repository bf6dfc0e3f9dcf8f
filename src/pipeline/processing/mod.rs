// Record processing: normalization, quality gate, tag mapping, reference dedup

pub mod catalog;
pub mod normalize;
pub mod quality_gate;
pub mod tag_mapper;

pub use normalize::NormalizedStation;
pub use quality_gate::{DefaultQualityGate, QualityGate};
pub use tag_mapper::{TagMapper, VocabularyTagMapper, CANONICAL_TAGS};
