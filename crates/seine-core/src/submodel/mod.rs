//! Biological submodels.
//!
//! Five families — growth, maturity, selectivity, recruitment, depletion —
//! each a sum type with a small fixed operation surface. Instances live in
//! per-family arenas owned by the model; populations and fleets hold typed
//! index handles, so one instance can be shared across entities while
//! `Prepare` can still mutate it (recompute caches, transform parameters)
//! without interior mutability.

pub mod depletion;
pub mod growth;
pub mod maturity;
pub mod recruitment;
pub mod selectivity;

pub use depletion::Depletion;
pub use growth::Growth;
pub use maturity::Maturity;
pub use recruitment::Recruitment;
pub use selectivity::Selectivity;

use crate::math::Scalar;
use crate::params::ParameterVector;

/// Index of a growth submodel in its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthHandle(pub(crate) usize);

/// Index of a maturity submodel in its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaturityHandle(pub(crate) usize);

/// Index of a selectivity submodel in its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectivityHandle(pub(crate) usize);

/// Index of a recruitment submodel in its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecruitmentHandle(pub(crate) usize);

/// Index of a depletion submodel in its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepletionHandle(pub(crate) usize);

/// The per-family arenas. Family order (growth, maturity, selectivity,
/// recruitment, depletion) is also the parameter-registration order.
#[derive(Debug, Default)]
pub struct SubmoduleSet<T> {
    pub growth: Vec<Growth<T>>,
    pub maturity: Vec<Maturity<T>>,
    pub selectivity: Vec<Selectivity<T>>,
    pub recruitment: Vec<Recruitment<T>>,
    pub depletion: Vec<Depletion<T>>,
}

impl<T: Scalar> SubmoduleSet<T> {
    pub fn new() -> Self {
        Self {
            growth: Vec::new(),
            maturity: Vec::new(),
            selectivity: Vec::new(),
            recruitment: Vec::new(),
            depletion: Vec::new(),
        }
    }

    pub fn add_growth(&mut self, g: Growth<T>) -> GrowthHandle {
        self.growth.push(g);
        GrowthHandle(self.growth.len() - 1)
    }

    pub fn add_maturity(&mut self, m: Maturity<T>) -> MaturityHandle {
        self.maturity.push(m);
        MaturityHandle(self.maturity.len() - 1)
    }

    pub fn add_selectivity(&mut self, s: Selectivity<T>) -> SelectivityHandle {
        self.selectivity.push(s);
        SelectivityHandle(self.selectivity.len() - 1)
    }

    pub fn add_recruitment(&mut self, r: Recruitment<T>) -> RecruitmentHandle {
        self.recruitment.push(r);
        RecruitmentHandle(self.recruitment.len() - 1)
    }

    pub fn add_depletion(&mut self, d: Depletion<T>) -> DepletionHandle {
        self.depletion.push(d);
        DepletionHandle(self.depletion.len() - 1)
    }

    pub fn growth(&self, h: GrowthHandle) -> &Growth<T> {
        &self.growth[h.0]
    }

    pub fn maturity(&self, h: MaturityHandle) -> &Maturity<T> {
        &self.maturity[h.0]
    }

    pub fn selectivity(&self, h: SelectivityHandle) -> &Selectivity<T> {
        &self.selectivity[h.0]
    }

    pub fn recruitment(&self, h: RecruitmentHandle) -> &Recruitment<T> {
        &self.recruitment[h.0]
    }

    pub fn recruitment_mut(&mut self, h: RecruitmentHandle) -> &mut Recruitment<T> {
        &mut self.recruitment[h.0]
    }

    pub fn depletion(&self, h: DepletionHandle) -> &Depletion<T> {
        &self.depletion[h.0]
    }

    pub fn depletion_mut(&mut self, h: DepletionHandle) -> &mut Depletion<T> {
        &mut self.depletion[h.0]
    }

    /// Refresh every cached product after a parameter update.
    pub fn prepare(&mut self) {
        for g in &mut self.growth {
            g.prepare();
        }
        for r in &mut self.recruitment {
            r.prepare();
        }
        for d in &mut self.depletion {
            d.prepare();
        }
    }

    /// Visit every parameter vector in registration order (family order,
    /// then arena order, then declaration order within the instance).
    pub(crate) fn visit_parameters(
        &mut self,
        visit: &mut impl FnMut(crate::context::ObjectId, &'static str, &mut ParameterVector<T>),
    ) {
        for g in &mut self.growth {
            g.visit_parameters(visit);
        }
        for m in &mut self.maturity {
            m.visit_parameters(visit);
        }
        for s in &mut self.selectivity {
            s.visit_parameters(visit);
        }
        for r in &mut self.recruitment {
            r.visit_parameters(visit);
        }
        for d in &mut self.depletion {
            d.visit_parameters(visit);
        }
    }
}
