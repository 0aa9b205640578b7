//! Gradient clipping by the global L2 norm over all parameters.
//!
//! burn's optimizer-level clipping bounds each parameter tensor on its own;
//! here the norm is taken over the concatenation of every gradient, so the
//! whole update direction is rescaled at once.

use std::marker::PhantomData;

use burn::module::{AutodiffModule, ModuleVisitor, ParamId};
use burn::optim::GradientsParams;
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;

const NORM_EPS: f32 = 1e-6;

/// Rescale `grads` so their global L2 norm is at most `max_norm`.
///
/// Every gradient is multiplied by `max_norm / (norm + 1e-6)` when
/// `norm > max_norm` and left untouched otherwise. Returns the clipped
/// gradients and the norm measured before clipping.
pub fn clip_grad_norm<B, M>(model: &M, grads: GradientsParams, max_norm: f32) -> (GradientsParams, f32)
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    let norm = global_grad_norm::<B, M>(model, &grads);
    if norm <= max_norm || !norm.is_finite() {
        return (grads, norm);
    }

    let mut scaler = GradScaler::<B> {
        grads,
        scale: max_norm / (norm + NORM_EPS),
        _backend: PhantomData,
    };
    model.visit(&mut scaler);
    (scaler.grads, norm)
}

/// L2 norm over every float parameter gradient of `model`.
pub fn global_grad_norm<B, M>(model: &M, grads: &GradientsParams) -> f32
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    let mut visitor = SquaredNorm::<B> {
        grads,
        sum_sq: 0.0,
        _backend: PhantomData,
    };
    model.visit(&mut visitor);
    visitor.sum_sq.sqrt() as f32
}

struct SquaredNorm<'a, B: AutodiffBackend> {
    grads: &'a GradientsParams,
    sum_sq: f64,
    _backend: PhantomData<B>,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for SquaredNorm<'_, B> {
    fn visit_float<const D: usize>(&mut self, id: ParamId, _tensor: &Tensor<B, D>) {
        if let Some(grad) = self.grads.get::<B::InnerBackend, D>(id) {
            let sq = (grad.clone() * grad).sum().into_scalar().elem::<f64>();
            self.sum_sq += sq;
        }
    }
}

struct GradScaler<B: AutodiffBackend> {
    grads: GradientsParams,
    scale: f32,
    _backend: PhantomData<B>,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for GradScaler<B> {
    fn visit_float<const D: usize>(&mut self, id: ParamId, _tensor: &Tensor<B, D>) {
        if let Some(grad) = self.grads.remove::<B::InnerBackend, D>(id) {
            self.grads.register(id, grad.mul_scalar(self.scale));
        }
    }
}
