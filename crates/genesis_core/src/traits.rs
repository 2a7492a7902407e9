//! Bounded trait vector.
//!
//! Two families live here: the five core traits and the seven middot
//! (sub-traits used for finer-grained balancing). Every value stays in
//! [0.0, 1.0]; mutation goes through `adjust`/`set`, which saturate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Guard against NaN and Infinity in trait values.
/// Non-finite values are replaced with the provided fallback.
#[inline]
fn sanitize_f64(v: f64, fallback: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        tracing::warn!("NaN/Inf detected in trait value, resetting to {}", fallback);
        fallback
    }
}

#[inline]
fn saturate(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreTrait {
    SelfAwareness,
    SpiritualDevelopment,
    RelationalCapacity,
    CreativeAbility,
    EthicalFoundation,
}

impl CoreTrait {
    pub const ALL: [CoreTrait; 5] = [
        CoreTrait::SelfAwareness,
        CoreTrait::SpiritualDevelopment,
        CoreTrait::RelationalCapacity,
        CoreTrait::CreativeAbility,
        CoreTrait::EthicalFoundation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CoreTrait::SelfAwareness => "self_awareness",
            CoreTrait::SpiritualDevelopment => "spiritual_development",
            CoreTrait::RelationalCapacity => "relational_capacity",
            CoreTrait::CreativeAbility => "creative_ability",
            CoreTrait::EthicalFoundation => "ethical_foundation",
        }
    }

    fn default_value(&self) -> f64 {
        match self {
            CoreTrait::SelfAwareness => 0.6,
            CoreTrait::SpiritualDevelopment => 0.5,
            CoreTrait::RelationalCapacity => 0.7,
            CoreTrait::CreativeAbility => 0.5,
            CoreTrait::EthicalFoundation => 0.8,
        }
    }
}

/// One of the seven middot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Middah {
    /// loving-kindness
    Chesed,
    /// strength/discipline
    Gevurah,
    /// harmony/beauty
    Tiferet,
    /// endurance
    Netzach,
    /// humility/gratitude
    Hod,
    /// foundation/connection
    Yesod,
    /// sovereignty/manifestation
    Malchut,
}

impl Middah {
    pub const ALL: [Middah; 7] = [
        Middah::Chesed,
        Middah::Gevurah,
        Middah::Tiferet,
        Middah::Netzach,
        Middah::Hod,
        Middah::Yesod,
        Middah::Malchut,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Middah::Chesed => "chesed",
            Middah::Gevurah => "gevurah",
            Middah::Tiferet => "tiferet",
            Middah::Netzach => "netzach",
            Middah::Hod => "hod",
            Middah::Yesod => "yesod",
            Middah::Malchut => "malchut",
        }
    }

    fn default_value(&self) -> f64 {
        match self {
            Middah::Chesed => 0.6,
            Middah::Gevurah => 0.5,
            Middah::Tiferet => 0.6,
            Middah::Netzach => 0.4,
            Middah::Hod => 0.4,
            Middah::Yesod => 0.5,
            Middah::Malchut => 0.3,
        }
    }
}

/// Any addressable trait. Unknown names are unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trait {
    Core(CoreTrait),
    Middah(Middah),
}

impl From<CoreTrait> for Trait {
    fn from(t: CoreTrait) -> Self {
        Trait::Core(t)
    }
}

impl From<Middah> for Trait {
    fn from(m: Middah) -> Self {
        Trait::Middah(m)
    }
}

impl fmt::Display for Trait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trait::Core(t) => f.write_str(t.as_str()),
            Trait::Middah(m) => f.write_str(m.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraitFamily {
    Core,
    Middot,
}

/// The seven middot as a secondary bounded vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Middot {
    chesed: f64,
    gevurah: f64,
    tiferet: f64,
    netzach: f64,
    hod: f64,
    yesod: f64,
    malchut: f64,
}

impl Default for Middot {
    fn default() -> Self {
        Self {
            chesed: Middah::Chesed.default_value(),
            gevurah: Middah::Gevurah.default_value(),
            tiferet: Middah::Tiferet.default_value(),
            netzach: Middah::Netzach.default_value(),
            hod: Middah::Hod.default_value(),
            yesod: Middah::Yesod.default_value(),
            malchut: Middah::Malchut.default_value(),
        }
    }
}

impl Middot {
    fn slot(&self, m: Middah) -> &f64 {
        match m {
            Middah::Chesed => &self.chesed,
            Middah::Gevurah => &self.gevurah,
            Middah::Tiferet => &self.tiferet,
            Middah::Netzach => &self.netzach,
            Middah::Hod => &self.hod,
            Middah::Yesod => &self.yesod,
            Middah::Malchut => &self.malchut,
        }
    }

    fn slot_mut(&mut self, m: Middah) -> &mut f64 {
        match m {
            Middah::Chesed => &mut self.chesed,
            Middah::Gevurah => &mut self.gevurah,
            Middah::Tiferet => &mut self.tiferet,
            Middah::Netzach => &mut self.netzach,
            Middah::Hod => &mut self.hod,
            Middah::Yesod => &mut self.yesod,
            Middah::Malchut => &mut self.malchut,
        }
    }
}

/// Scalar trait values with saturating arithmetic.
///
/// Serialized flat (one key per core trait plus a `middot` object) so the
/// state document stays readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraitStore {
    self_awareness: f64,
    spiritual_development: f64,
    relational_capacity: f64,
    creative_ability: f64,
    ethical_foundation: f64,
    middot: Middot,
}

impl Default for TraitStore {
    fn default() -> Self {
        Self {
            self_awareness: CoreTrait::SelfAwareness.default_value(),
            spiritual_development: CoreTrait::SpiritualDevelopment.default_value(),
            relational_capacity: CoreTrait::RelationalCapacity.default_value(),
            creative_ability: CoreTrait::CreativeAbility.default_value(),
            ethical_foundation: CoreTrait::EthicalFoundation.default_value(),
            middot: Middot::default(),
        }
    }
}

impl TraitStore {
    fn slot_mut(&mut self, t: Trait) -> &mut f64 {
        match t {
            Trait::Core(CoreTrait::SelfAwareness) => &mut self.self_awareness,
            Trait::Core(CoreTrait::SpiritualDevelopment) => &mut self.spiritual_development,
            Trait::Core(CoreTrait::RelationalCapacity) => &mut self.relational_capacity,
            Trait::Core(CoreTrait::CreativeAbility) => &mut self.creative_ability,
            Trait::Core(CoreTrait::EthicalFoundation) => &mut self.ethical_foundation,
            Trait::Middah(m) => self.middot.slot_mut(m),
        }
    }

    pub fn get(&self, t: impl Into<Trait>) -> f64 {
        match t.into() {
            Trait::Core(CoreTrait::SelfAwareness) => self.self_awareness,
            Trait::Core(CoreTrait::SpiritualDevelopment) => self.spiritual_development,
            Trait::Core(CoreTrait::RelationalCapacity) => self.relational_capacity,
            Trait::Core(CoreTrait::CreativeAbility) => self.creative_ability,
            Trait::Core(CoreTrait::EthicalFoundation) => self.ethical_foundation,
            Trait::Middah(m) => *self.middot.slot(m),
        }
    }

    /// Add `delta` and saturate to [0, 1]. Returns the new value.
    pub fn adjust(&mut self, t: impl Into<Trait>, delta: f64) -> f64 {
        let slot = self.slot_mut(t.into());
        *slot = saturate(*slot + sanitize_f64(delta, 0.0));
        *slot
    }

    /// Overwrite a value, saturating to [0, 1]. Returns the stored value.
    pub fn set(&mut self, t: impl Into<Trait>, value: f64) -> f64 {
        let t = t.into();
        let current = self.get(t);
        let slot = self.slot_mut(t);
        *slot = saturate(sanitize_f64(value, current));
        *slot
    }

    pub fn self_awareness(&self) -> f64 {
        self.self_awareness
    }

    pub fn spiritual_development(&self) -> f64 {
        self.spiritual_development
    }

    /// Arithmetic mean over one family.
    pub fn average(&self, family: TraitFamily) -> f64 {
        let values = self.values(family);
        values.iter().map(|(_, v)| v).sum::<f64>() / values.len() as f64
    }

    /// (name, value) pairs for one family, in declaration order.
    pub fn values(&self, family: TraitFamily) -> Vec<(Trait, f64)> {
        match family {
            TraitFamily::Core => CoreTrait::ALL
                .iter()
                .map(|t| (Trait::Core(*t), self.get(*t)))
                .collect(),
            TraitFamily::Middot => Middah::ALL
                .iter()
                .map(|m| (Trait::Middah(*m), self.get(*m)))
                .collect(),
        }
    }

    /// Sanitize and clamp every value. Used after loading from disk.
    pub fn normalize(&mut self) {
        for t in CoreTrait::ALL {
            let slot = self.slot_mut(t.into());
            *slot = saturate(sanitize_f64(*slot, t.default_value()));
        }
        for m in Middah::ALL {
            let slot = self.slot_mut(m.into());
            *slot = saturate(sanitize_f64(*slot, m.default_value()));
        }
    }
}
