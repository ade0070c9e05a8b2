// ============================================================
// Layer 5 — Global Gradient Norm Clipping
// ============================================================
// Rescales ALL gradients together so their combined L2 norm
// stays under a threshold:
//
//   total = sqrt( Σ_params ‖g‖² )
//   coef  = max_norm / (total + 1e-6)
//   g    ← g · coef                      only when coef < 1
//
// Runs between backward() and step(). The optimiser is built
// without burn's per-tensor clipping option.
//
// Gradients live on the inner backend, keyed by parameter id,
// so two visitors walk the module: one sums squared norms, the
// other swaps every gradient for its scaled copy.

use burn::{
    module::{AutodiffModule, ModuleVisitor, ParamId},
    optim::GradientsParams,
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use std::marker::PhantomData;

const NORM_EPS: f64 = 1e-6;

struct SquaredNorm<'a, B: AutodiffBackend> {
    grads: &'a GradientsParams,
    total: Option<Tensor<B::InnerBackend, 1>>,
    _b:    PhantomData<B>,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for SquaredNorm<'_, B> {
    fn visit_float<const D: usize>(&mut self, id: ParamId, _tensor: &Tensor<B, D>) {
        if let Some(grad) = self.grads.get::<B::InnerBackend, D>(id) {
            let sq = grad.powf_scalar(2.0).sum();
            self.total = Some(match self.total.take() {
                Some(total) => total + sq,
                None        => sq,
            });
        }
    }
}

struct Scale<'a, B: AutodiffBackend> {
    grads: &'a mut GradientsParams,
    coef:  f64,
    _b:    PhantomData<B>,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for Scale<'_, B> {
    fn visit_float<const D: usize>(&mut self, id: ParamId, _tensor: &Tensor<B, D>) {
        if let Some(grad) = self.grads.remove::<B::InnerBackend, D>(id) {
            self.grads.register::<B::InnerBackend, D>(id, grad.mul_scalar(self.coef));
        }
    }
}

/// Combined L2 norm of every gradient that belongs to `module`.
pub fn global_grad_norm<B, M>(module: &M, grads: &GradientsParams) -> f64
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    let mut visitor = SquaredNorm::<B> { grads, total: None, _b: PhantomData };
    module.visit(&mut visitor);
    visitor
        .total
        .map_or(0.0, |t| t.into_scalar().elem::<f64>().sqrt())
}

/// Scale `grads` in place so their combined norm is at most
/// `max_norm`. Returns the norm measured before clipping.
pub fn clip_grad_norm<B, M>(module: &M, grads: &mut GradientsParams, max_norm: f64) -> f64
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    let total = global_grad_norm::<B, M>(module, grads);
    let coef  = max_norm / (total + NORM_EPS);
    if coef < 1.0 {
        let mut visitor = Scale::<B> { grads, coef, _b: PhantomData };
        module.visit(&mut visitor);
    }
    total
}
