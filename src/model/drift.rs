use crate::intervention::DrugEffect;

use super::{Parameters, NSTATES};

/// Right-hand side of the skin model.
///
/// Writes `dc/dt` for state `c` at time `t` (weeks) into `dc`, with the
/// cytokine pathways perturbed by `de`. Both slices must hold [NSTATES]
/// values. No domain checks are made: out-of-range states produce
/// non-finite derivatives that surface later as invalid scores.
///
/// State layout:
/// - `c[0]` skin barrier integrity
/// - `c[1]` infiltrated pathogens
/// - `c[2..6]` Th1, Th2, Th17, Th22
/// - `c[6..14]` IL4, IL13, IL17, IL22, IL31, IFNg, TSLP, OX40L
#[inline(always)]
pub fn drift(c: &[f64], _t: f64, de: &DrugEffect, x: &Parameters, dc: &mut [f64]) {
    debug_assert_eq!(c.len(), NSTATES);
    debug_assert_eq!(dc.len(), NSTATES);

    let k3 = x.k3.min(de.production_cap());
    let k4 = x.d8;
    let ea2 = de.il13_binding.efficacy();

    // Effective cytokine levels seen by their targets
    let il4 = (1.0 - de.il4) * c[6];
    let il13 = (1.0 - de.il13 * ea2) * c[7];
    let il17 = (1.0 - de.il17) * c[8];
    let il22 = (1.0 - de.il22) * c[9];
    let il31 = (1.0 - de.il31) * c[10];
    let ifng = c[11] + de.ifng;
    let tslp = (1.0 - de.tslp) * c[12];
    let ox40 = (1.0 - de.ox40) * c[13];

    // Skin barrier integrity
    dc[0] = (1.0 - c[0]) * (x.k1 + x.k2 * il22 + k3)
        / ((1.0 + x.b1 * il4)
            * (1.0 + x.b2 * il13)
            * (1.0 + x.b3 * il17)
            * (1.0 + x.b4 * il22)
            * (1.0 + x.b5 * il31))
        - c[0] * (x.d1 * (1.0 + x.d3 * c[1]) + x.d2 * il31);

    // Infiltrated pathogens
    dc[1] = k4 / (1.0 + x.b6 * c[0])
        - c[1]
            * ((1.0 + x.d4 * c[1])
                * (1.0 + x.d5 * il17)
                * (1.0 + x.d6 * il22)
                * (1.0 + x.d7 * ifng)
                / ((1.0 + x.b7 * il4) * (1.0 + x.b8 * il13))
                + x.d8);

    // T-helper subsets share the differentiation denominator and OX40L-delayed loss
    let den = 4.0 + x.k9 * ifng + x.k10 * il4;
    let loss = x.d9 / (1.0 + x.b9 * ox40);
    dc[2] = x.k5 * c[1] * (1.0 + x.k9 * ifng) / den - loss * c[2];
    dc[3] = x.k6 * c[1] * (1.0 + x.k10 * il4) / den - loss * c[3];
    dc[4] = x.k7 * c[1] / den - loss * c[4];
    dc[5] = x.k8 * c[1] / den - loss * c[5];

    // Cytokines
    dc[6] = x.k11 * c[3] + x.k12 - x.d10 * c[6];
    dc[7] = x.k13 * c[3] + x.k14 - x.d11 * c[7];
    dc[8] = x.k15 * c[4] + x.k16 - x.d12 * c[8];
    dc[9] = x.k17 * c[5] + x.k18 - x.d13 * c[9];
    dc[10] = x.k19 * c[3] + x.k20 - x.d14 * c[10];
    dc[11] = x.k21 * c[2] + x.k22 - x.d15 * c[11];
    dc[12] = x.k23 * c[1] + x.k24 - x.d16 * c[12];
    dc[13] = x.k25 * tslp + x.k26 - x.d17 * c[13];
}

/// Directional derivative `J(c)·v` of [drift], by a scaled forward difference.
pub fn jacobian_vector_product(
    c: &[f64],
    t: f64,
    v: &[f64],
    de: &DrugEffect,
    x: &Parameters,
    jv: &mut [f64],
) {
    let vnorm = v.iter().map(|vi| vi * vi).sum::<f64>().sqrt();
    if vnorm == 0.0 {
        jv.fill(0.0);
        return;
    }
    let cnorm = c.iter().map(|ci| ci * ci).sum::<f64>().sqrt();
    let h = f64::EPSILON.sqrt() * (1.0 + cnorm) / vnorm;

    let mut shifted = [0.0; NSTATES];
    for i in 0..NSTATES {
        shifted[i] = c[i] + h * v[i];
    }
    let mut f0 = [0.0; NSTATES];
    let mut f1 = [0.0; NSTATES];
    drift(c, t, de, x, &mut f0);
    drift(&shifted, t, de, x, &mut f1);
    for i in 0..NSTATES {
        jv[i] = (f1[i] - f0[i]) / h;
    }
}
