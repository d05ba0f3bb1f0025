//! Catalog of the simulated treatment arms.
//!
//! Each [Intervention] maps to a constant [DrugEffect] describing how strongly
//! it suppresses (or, for recombinant IFNg, stimulates) specific cytokine
//! pathways inside [crate::model::drift].

use serde::{Deserialize, Serialize};

/// Number of arms simulated for each virtual patient.
pub const NINTERVENTIONS: usize = 10;

/// Legacy magnitude used to leave the barrier production term unclamped.
pub const UNCLAMPED_SENTINEL: f64 = 1e20;

/// Efficacy of an IL13 antibody that does not block receptor binding.
pub const PARTIAL_IL13_EFFICACY: f64 = 0.4396;

/// Exogenous barrier production `k3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Production {
    /// `k3` is forced to zero (drug-free equilibration)
    Blocked,
    /// `k3` keeps its sampled value (every treatment arm, placebo included)
    Unclamped,
}

/// How an anti-IL13 antibody neutralises IL13.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Il13Binding {
    /// Blocks IL13 binding to both receptor subunits
    Full,
    /// Leaves IL13Rα1 binding intact, scaling efficacy by [PARTIAL_IL13_EFFICACY]
    Partial,
}

impl Il13Binding {
    #[inline(always)]
    pub fn efficacy(self) -> f64 {
        match self {
            Il13Binding::Full => 1.0,
            Il13Binding::Partial => PARTIAL_IL13_EFFICACY,
        }
    }
}

/// Perturbation applied by one intervention.
///
/// Inhibition fractions lie in `[0, 1]` and multiply the corresponding cytokine
/// level by `1 - fraction`; `ifng` is added to the IFNg level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrugEffect {
    pub production: Production,
    pub il4: f64,
    pub il13: f64,
    pub il17: f64,
    pub il22: f64,
    pub il31: f64,
    pub tslp: f64,
    pub ox40: f64,
    pub ifng: f64,
    pub il13_binding: Il13Binding,
}

impl DrugEffect {
    /// No active drug and no exogenous barrier production.
    pub const EQUILIBRATION: DrugEffect = DrugEffect {
        production: Production::Blocked,
        il4: 0.0,
        il13: 0.0,
        il17: 0.0,
        il22: 0.0,
        il31: 0.0,
        tslp: 0.0,
        ox40: 0.0,
        ifng: 0.0,
        il13_binding: Il13Binding::Full,
    };

    /// Baseline every treatment arm starts from.
    pub const PLACEBO: DrugEffect = DrugEffect {
        production: Production::Unclamped,
        ..DrugEffect::EQUILIBRATION
    };

    /// Upper bound applied to the sampled `k3`.
    #[inline(always)]
    pub fn production_cap(&self) -> f64 {
        match self.production {
            Production::Blocked => 0.0,
            Production::Unclamped => f64::INFINITY,
        }
    }

    /// Flat ten-component encoding:
    /// `[k3 cap, IL4, IL13, IL17, IL22, IL31, TSLP, OX40, IFNg, IL13 binding flag]`.
    pub fn encode(&self) -> [f64; NINTERVENTIONS] {
        let cap = match self.production {
            Production::Blocked => 0.0,
            Production::Unclamped => UNCLAMPED_SENTINEL,
        };
        let binding = match self.il13_binding {
            Il13Binding::Full => 1.0,
            Il13Binding::Partial => 0.0,
        };
        [
            cap, self.il4, self.il13, self.il17, self.il22, self.il31, self.tslp, self.ox40,
            self.ifng, binding,
        ]
    }
}

/// Treatment arms, in output column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intervention {
    Placebo,
    Dupilumab,
    Nemolizumab,
    Tezepelumab,
    Gbr830,
    Fezakinumab,
    Secukinumab,
    Rifng,
    Tralokinumab,
    Lebrikizumab,
}

impl Intervention {
    pub const ALL: [Intervention; NINTERVENTIONS] = [
        Intervention::Placebo,
        Intervention::Dupilumab,
        Intervention::Nemolizumab,
        Intervention::Tezepelumab,
        Intervention::Gbr830,
        Intervention::Fezakinumab,
        Intervention::Secukinumab,
        Intervention::Rifng,
        Intervention::Tralokinumab,
        Intervention::Lebrikizumab,
    ];

    /// Output column of this arm.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Intervention::Placebo => "placebo",
            Intervention::Dupilumab => "dupilumab",
            Intervention::Nemolizumab => "nemolizumab",
            Intervention::Tezepelumab => "tezepelumab",
            Intervention::Gbr830 => "GBR 830",
            Intervention::Fezakinumab => "fezakinumab",
            Intervention::Secukinumab => "secukinumab",
            Intervention::Rifng => "rIFNg",
            Intervention::Tralokinumab => "tralokinumab",
            Intervention::Lebrikizumab => "lebrikizumab",
        }
    }

    /// Pathway(s) targeted by the drug.
    pub fn target(self) -> &'static str {
        match self {
            Intervention::Placebo => "none",
            Intervention::Dupilumab => "IL4/IL13",
            Intervention::Nemolizumab => "IL31",
            Intervention::Tezepelumab => "TSLP",
            Intervention::Gbr830 => "OX40",
            Intervention::Fezakinumab => "IL22",
            Intervention::Secukinumab => "IL17A",
            Intervention::Rifng => "IFNg",
            Intervention::Tralokinumab => "IL13",
            Intervention::Lebrikizumab => "IL13",
        }
    }

    pub fn effect(self) -> DrugEffect {
        let placebo = DrugEffect::PLACEBO;
        match self {
            Intervention::Placebo => placebo,
            Intervention::Dupilumab => DrugEffect {
                il4: 0.99,
                il13: 0.99,
                ..placebo
            },
            Intervention::Nemolizumab => DrugEffect {
                il31: 0.99,
                ..placebo
            },
            Intervention::Tezepelumab => DrugEffect {
                tslp: 0.99,
                ..placebo
            },
            Intervention::Gbr830 => DrugEffect {
                ox40: 0.99,
                ..placebo
            },
            Intervention::Fezakinumab => DrugEffect {
                il22: 0.99,
                ..placebo
            },
            Intervention::Secukinumab => DrugEffect {
                il17: 0.99,
                ..placebo
            },
            Intervention::Rifng => DrugEffect {
                ifng: 210.0,
                ..placebo
            },
            Intervention::Tralokinumab => DrugEffect {
                il13: 0.99,
                il13_binding: Il13Binding::Partial,
                ..placebo
            },
            Intervention::Lebrikizumab => DrugEffect {
                il13: 0.99,
                ..placebo
            },
        }
    }
}

impl std::fmt::Display for Intervention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
