//! Time-driven effect simulator.
//!
//! RULE: the simulator owns the lifecycle of active effect instances
//! (creation, delay, ticks, expiry). It never decides which effect an
//! action should apply; callers hand it template ids.
//!
//! Status-specific behaviour (dynamic intervals, early removal) plugs in
//! through EffectHook so the core loop stays generic.

use crate::{
    character::{AbilityScores, Character},
    effect::{Ability, ActiveEffect, EffectMessage, EnrichedEffect},
    error::GameResult,
    templates::EffectTemplateStore,
    types::Minutes,
};
use std::collections::BTreeMap;

/// Per-effect overrides consulted while advancing time.
///
/// During `advance` the character's effect list is detached, so hooks
/// should only read counters, never `active_effects`.
pub trait EffectHook {
    /// Interval to use for this tick instead of the template value.
    fn tick_interval(&self, _effect_id: &str, base: Minutes, _character: &Character) -> Minutes {
        base
    }

    /// Return false to drop the instance even though it has not expired.
    fn retain(&self, _effect_id: &str, _character: &Character) -> bool {
        true
    }
}

pub struct EffectSimulator<'a> {
    templates: &'a dyn EffectTemplateStore,
    hooks:     Vec<Box<dyn EffectHook + 'a>>,
}

impl<'a> EffectSimulator<'a> {
    pub fn new(templates: &'a dyn EffectTemplateStore) -> Self {
        Self { templates, hooks: Vec::new() }
    }

    pub fn with_hook(mut self, hook: impl EffectHook + 'a) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn templates(&self) -> &'a dyn EffectTemplateStore {
        self.templates
    }

    /// Apply every component of a template. Instant components change
    /// counters now; the rest become active instances.
    ///
    /// Fails before touching the character if the template is unknown.
    pub fn apply_template(
        &self,
        character: &mut Character,
        effect_id: &str,
    ) -> GameResult<EffectMessage> {
        let template = self.templates.template(effect_id)?;
        let applied_at = character.clock.time_of_day;

        for (index, component) in template.components.iter().enumerate() {
            if component.is_instant() {
                character.apply_instant(component.kind, component.value);
            } else {
                character.active_effects.push(ActiveEffect::from_component(
                    &template.id,
                    index,
                    component,
                    applied_at,
                ));
            }
        }

        log::debug!(
            "applied effect={} components={} day={} tod={}",
            template.id,
            template.components.len(),
            character.clock.current_day,
            applied_at
        );
        Ok(template.message())
    }

    /// Advance every active instance by `elapsed` minutes: delay gating,
    /// periodic ticks, duration countdown, then retention.
    ///
    /// Returns the messages of ticks that carry one, in firing order.
    pub fn advance(&self, character: &mut Character, elapsed: Minutes) -> Vec<EffectMessage> {
        let mut messages = Vec::new();
        if elapsed <= 0 || character.active_effects.is_empty() {
            return messages;
        }

        let effects = std::mem::take(&mut character.active_effects);
        let mut kept = Vec::with_capacity(effects.len());

        for mut effect in effects {
            let component = match self.templates.component(&effect.effect_id, effect.effect_index) {
                Ok(c) => c.clone(),
                Err(e) => {
                    log::warn!("advance: skipping effect={} ({e})", effect.effect_id);
                    kept.push(effect);
                    continue;
                }
            };

            // Delay gating. Only the overshoot past the delay counts below.
            let mut span = elapsed;
            if effect.delay_remaining > 0 {
                if effect.delay_remaining > span {
                    effect.delay_remaining -= span;
                    kept.push(effect);
                    continue;
                }
                span -= effect.delay_remaining;
                effect.delay_remaining = 0;
            }

            // A timed instance cannot tick past its own expiry.
            let timed = !effect.is_permanent();
            let live_span = if timed {
                span.min(effect.duration_remaining.max(0))
            } else {
                span
            };

            if live_span > 0 && component.tick_interval > 0 {
                effect.tick_accumulator += live_span;
                loop {
                    let interval = self.tick_interval(&effect.effect_id, component.tick_interval, character);
                    if interval <= 0 || effect.tick_accumulator < interval {
                        break;
                    }
                    effect.tick_accumulator -= interval;
                    character.apply_instant(component.kind, component.value);
                    if let Some(text) = component.tick_message.as_deref().filter(|t| !t.is_empty()) {
                        messages.push(self.tick_message(&effect.effect_id, text));
                    }
                }
            }

            // Reaching exactly zero keeps the instance; crossing below drops it.
            if timed {
                effect.duration_remaining -= span;
                if effect.duration_remaining < 0 {
                    log::debug!("effect={} expired", effect.effect_id);
                    continue;
                }
            }

            if !self.retain(&effect.effect_id, character) {
                log::debug!("effect={} dropped by retention hook", effect.effect_id);
                continue;
            }
            kept.push(effect);
        }

        character.active_effects = kept;
        messages
    }

    /// Large time skip (sleep): count durations down without firing ticks.
    /// Permanent instances are left untouched.
    pub fn decay_durations_only(&self, character: &mut Character, elapsed: Minutes) {
        if elapsed <= 0 {
            return;
        }
        character.active_effects.retain_mut(|effect| {
            if effect.is_permanent() {
                return true;
            }
            effect.duration_remaining -= elapsed;
            effect.delay_remaining = (effect.delay_remaining - elapsed).max(0);
            if effect.duration_remaining < 0 {
                log::debug!("effect={} expired during {elapsed}m skip", effect.effect_id);
                return false;
            }
            true
        });
    }

    /// Summed stat modifiers of every live (non-delayed) instance.
    pub fn stat_modifiers(&self, effects: &[ActiveEffect]) -> BTreeMap<Ability, i64> {
        let mut modifiers = BTreeMap::new();
        for effect in effects.iter().filter(|e| !e.is_delayed()) {
            let Ok(component) = self.templates.component(&effect.effect_id, effect.effect_index) else {
                continue;
            };
            if let Some(ability) = component.kind.ability() {
                *modifiers.entry(ability).or_insert(0) += component.value;
            }
        }
        modifiers
    }

    /// Base ability scores plus active modifiers.
    pub fn effective_abilities(&self, character: &Character) -> AbilityScores {
        let mut scores = character.stats;
        for (ability, delta) in self.stat_modifiers(&character.active_effects) {
            scores.set(ability, scores.get(ability) + delta);
        }
        scores
    }

    /// Display view of each instance with template metadata attached.
    /// Unknown templates fall back to the raw id.
    pub fn enrich(&self, effects: &[ActiveEffect]) -> Vec<EnrichedEffect> {
        effects
            .iter()
            .map(|effect| {
                let mut enriched = EnrichedEffect {
                    effect:         effect.clone(),
                    name:           effect.effect_id.clone(),
                    description:    String::new(),
                    category:       "modifier".into(),
                    stat_modifiers: BTreeMap::new(),
                    tick_interval:  0,
                };
                if let Ok(template) = self.templates.template(&effect.effect_id) {
                    enriched.name = template.name.clone();
                    enriched.description = template.description.clone();
                    enriched.category = template.category.clone();
                    for component in &template.components {
                        if let Some(ability) = component.kind.ability() {
                            enriched.stat_modifiers.insert(ability, component.value);
                        }
                        if component.tick_interval > 0 {
                            enriched.tick_interval = component.tick_interval;
                        }
                    }
                }
                enriched
            })
            .collect()
    }

    // ── Hook dispatch ──────────────────────────────────────────────────────

    fn tick_interval(&self, effect_id: &str, base: Minutes, character: &Character) -> Minutes {
        self.hooks
            .iter()
            .fold(base, |interval, hook| hook.tick_interval(effect_id, interval, character))
    }

    fn retain(&self, effect_id: &str, character: &Character) -> bool {
        self.hooks.iter().all(|hook| hook.retain(effect_id, character))
    }

    fn tick_message(&self, effect_id: &str, text: &str) -> EffectMessage {
        let mut message = self
            .templates
            .template(effect_id)
            .map(|t| t.message())
            .unwrap_or_default();
        message.message = text.to_string();
        message.silent = false;
        message
    }
}
