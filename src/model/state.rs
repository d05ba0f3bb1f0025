use serde::{Deserialize, Serialize};

/// Number of state variables of the skin model.
pub const NSTATES: usize = 14;

/// Levels of the 14 biological factors at one point in time.
pub type StateVector = [f64; NSTATES];

/// Physiological starting point of the drug-free equilibration run.
pub const INITIAL_STATE: StateVector = [
    0.5931, 0.4069, 3.1, 8.7, 2.0, 21.0, 38.0, 40.5, 5.4, 3.0, 2.0, 1.5, 4.4, 9.7,
];

/// Named index into a [StateVector].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum Compartment {
    /// Skin barrier integrity, nominally in `[0, 1]`
    Barrier = 0,
    /// Infiltrated pathogens
    Pathogen,
    Th1,
    Th2,
    Th17,
    Th22,
    Il4,
    Il13,
    Il17,
    Il22,
    Il31,
    Ifng,
    Tslp,
    Ox40l,
}

impl Compartment {
    pub const ALL: [Compartment; NSTATES] = [
        Compartment::Barrier,
        Compartment::Pathogen,
        Compartment::Th1,
        Compartment::Th2,
        Compartment::Th17,
        Compartment::Th22,
        Compartment::Il4,
        Compartment::Il13,
        Compartment::Il17,
        Compartment::Il22,
        Compartment::Il31,
        Compartment::Ifng,
        Compartment::Tslp,
        Compartment::Ox40l,
    ];

    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Compartment::Barrier => "skin barrier integrity",
            Compartment::Pathogen => "infiltrated pathogens",
            Compartment::Th1 => "Th1",
            Compartment::Th2 => "Th2",
            Compartment::Th17 => "Th17",
            Compartment::Th22 => "Th22",
            Compartment::Il4 => "IL4",
            Compartment::Il13 => "IL13",
            Compartment::Il17 => "IL17",
            Compartment::Il22 => "IL22",
            Compartment::Il31 => "IL31",
            Compartment::Ifng => "IFNg",
            Compartment::Tslp => "TSLP",
            Compartment::Ox40l => "OX40L",
        }
    }
}

/// Labels of the 15 baseline factors: the EASI score followed by every compartment.
pub fn baseline_factor_names() -> Vec<&'static str> {
    std::iter::once("EASI")
        .chain(Compartment::ALL.iter().map(|c| c.name()))
        .collect()
}
