//! Read-only effect template lookup.
//!
//! RULE: the core never mutates templates. Anything that can resolve a
//! template by id (bundled JSON, SQLite, a test fixture) implements
//! EffectTemplateStore and is passed in by reference.

use crate::{
    effect::{EffectComponent, EffectTemplate},
    error::{GameError, GameResult},
};

/// Effect ids renamed since older saves were written.
const LEGACY_EFFECT_IDS: &[(&str, &str)] = &[
    ("hunger-accumulation-well-fed",  "hunger-accumulation-wellfed"),
    ("hunger-accumulation-full",      "hunger-accumulation-stuffed"),
    ("hunger-accumulation-satisfied", "hunger-accumulation-wellfed"),
    ("famished",                      "starving"),
];

/// Map a legacy effect id to its current name. Unknown ids pass through.
pub fn normalize_effect_id(effect_id: &str) -> &str {
    LEGACY_EFFECT_IDS
        .iter()
        .find(|(old, _)| *old == effect_id)
        .map(|(_, new)| *new)
        .unwrap_or(effect_id)
}

pub trait EffectTemplateStore {
    /// Raw lookup by exact id.
    fn find_template(&self, effect_id: &str) -> Option<&EffectTemplate>;

    /// Lookup with legacy id normalization.
    fn template(&self, effect_id: &str) -> GameResult<&EffectTemplate> {
        let id = normalize_effect_id(effect_id);
        self.find_template(id)
            .ok_or_else(|| GameError::EffectNotFound { id: id.to_string() })
    }

    fn component(&self, effect_id: &str, index: usize) -> GameResult<&EffectComponent> {
        let template = self.template(effect_id)?;
        template
            .components
            .get(index)
            .ok_or_else(|| GameError::ComponentOutOfRange {
                id: template.id.clone(),
                index,
            })
    }
}
