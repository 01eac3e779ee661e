//! Effect data model: templates, their components, and the live
//! instances attached to a character.
//!
//! Templates are immutable game data shared by every character.
//! ActiveEffect is the only part that is persisted with a save; the
//! enriched display view is rebuilt from templates on demand.

use crate::types::{EffectId, Minutes};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The six ability stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub const ALL: [Ability; 6] = [
        Ability::Strength,
        Ability::Dexterity,
        Ability::Constitution,
        Ability::Intelligence,
        Ability::Wisdom,
        Ability::Charisma,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Strength     => "strength",
            Self::Dexterity    => "dexterity",
            Self::Constitution => "constitution",
            Self::Intelligence => "intelligence",
            Self::Wisdom       => "wisdom",
            Self::Charisma     => "charisma",
        }
    }
}

/// What a component acts on. Resource kinds change a core counter;
/// ability kinds modify a stat for as long as the instance is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Hp,
    Mana,
    Fatigue,
    Hunger,
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl EffectKind {
    /// The ability this kind modifies, if it is a stat modifier.
    pub fn ability(&self) -> Option<Ability> {
        match self {
            Self::Strength     => Some(Ability::Strength),
            Self::Dexterity    => Some(Ability::Dexterity),
            Self::Constitution => Some(Ability::Constitution),
            Self::Intelligence => Some(Ability::Intelligence),
            Self::Wisdom       => Some(Ability::Wisdom),
            Self::Charisma     => Some(Ability::Charisma),
            Self::Hp | Self::Mana | Self::Fatigue | Self::Hunger => None,
        }
    }

    pub fn is_stat_modifier(&self) -> bool {
        self.ability().is_some()
    }
}

/// One entry of a template's `effects` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectComponent {
    #[serde(rename = "type")]
    pub kind: EffectKind,
    #[serde(default)]
    pub value: i64,
    #[serde(default)]
    pub delay: Minutes,
    /// 0 = permanent.
    #[serde(default)]
    pub duration: Minutes,
    #[serde(default)]
    pub tick_interval: Minutes,
    /// Shown to the player every time a tick fires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick_message: Option<String>,
}

impl EffectComponent {
    /// Instant components have no delay, duration or tick interval and do
    /// not modify a stat. They are applied once and never tracked.
    pub fn is_instant(&self) -> bool {
        self.delay <= 0
            && self.duration <= 0
            && self.tick_interval <= 0
            && !self.kind.is_stat_modifier()
    }
}

fn default_category() -> String {
    "modifier".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectTemplate {
    pub id: EffectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub silent: bool,
    #[serde(rename = "effects")]
    pub components: Vec<EffectComponent>,
}

impl EffectTemplate {
    pub fn message(&self) -> EffectMessage {
        EffectMessage {
            message:  self.message.clone(),
            color:    self.color.clone(),
            category: self.category.clone(),
            silent:   self.silent,
        }
    }
}

/// A live occurrence of one template component on one character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub effect_id:          EffectId,
    pub effect_index:       usize,
    /// Minutes left before the component goes live. 0 = live.
    pub delay_remaining:    Minutes,
    /// Minutes left before expiry. 0 with a 0 total = permanent; 0 with a
    /// positive total = runs out on the next advance.
    pub duration_remaining: Minutes,
    /// Duration at creation. 0 = permanent.
    pub total_duration:     Minutes,
    /// Minutes elapsed since the last tick fired.
    pub tick_accumulator:   Minutes,
    /// Time of day (minutes) when the instance was created.
    pub applied_at:         Minutes,
}

impl ActiveEffect {
    pub fn from_component(
        effect_id:  &str,
        index:      usize,
        component:  &EffectComponent,
        applied_at: Minutes,
    ) -> Self {
        Self {
            effect_id:          effect_id.to_string(),
            effect_index:       index,
            delay_remaining:    component.delay.max(0),
            duration_remaining: component.duration.max(0),
            total_duration:     component.duration.max(0),
            tick_accumulator:   0,
            applied_at,
        }
    }

    pub fn is_permanent(&self) -> bool {
        self.total_duration == 0 && self.duration_remaining == 0
    }

    pub fn is_delayed(&self) -> bool {
        self.delay_remaining > 0
    }
}

/// Display message returned when a template is applied or a tick fires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectMessage {
    pub message:  String,
    pub color:    String,
    pub category: String,
    pub silent:   bool,
}

/// An active effect with template metadata resolved for the client.
/// Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedEffect {
    #[serde(flatten)]
    pub effect:         ActiveEffect,
    pub name:           String,
    pub description:    String,
    pub category:       String,
    pub stat_modifiers: BTreeMap<Ability, i64>,
    pub tick_interval:  Minutes,
}
