use nalgebra::{Isometry3, Point3, Translation3, Unit, UnitQuaternion, Vector3};

use drapery_core::error::SimError;

use crate::backend::{Skeleton, check_len};

/// One rigid body of a [`KinematicSkeleton`].
#[derive(Debug, Clone)]
pub struct BodySpec {
    pub name: String,
    pub parent: Option<usize>,
    /// Joint origin in the parent body frame.
    pub offset: Vector3<f64>,
    /// Revolute axes applied in order, one dof each.
    pub axes: Vec<Unit<Vector3<f64>>>,
    /// Centre of mass in the body frame.
    pub com: Vector3<f64>,
}

impl BodySpec {
    #[must_use]
    pub fn new(name: impl Into<String>, parent: Option<usize>, offset: Vector3<f64>) -> Self {
        Self {
            name: name.into(),
            parent,
            offset,
            axes: Vec::new(),
            com: Vector3::zeros(),
        }
    }

    #[must_use]
    pub fn with_axes(mut self, axes: &[Unit<Vector3<f64>>]) -> Self {
        self.axes = axes.to_vec();
        self
    }

    #[must_use]
    pub const fn with_com(mut self, com: Vector3<f64>) -> Self {
        self.com = com;
        self
    }
}

/// Tree of revolute joints driven by a joint-space double integrator.
///
/// Bodies must be listed parents-first. There is no mass matrix, gravity or
/// contact: `tau` is applied as a joint acceleration.
#[derive(Debug, Clone)]
pub struct KinematicSkeleton {
    bodies: Vec<BodySpec>,
    dof_start: Vec<usize>,
    q: Vec<f64>,
    dq: Vec<f64>,
    limits: Vec<(f64, f64)>,
    transforms: Vec<Isometry3<f64>>,
}

impl KinematicSkeleton {
    #[must_use]
    pub fn new(bodies: Vec<BodySpec>) -> Self {
        let mut dof_start = Vec::with_capacity(bodies.len());
        let mut ndofs = 0;
        for body in &bodies {
            dof_start.push(ndofs);
            ndofs += body.axes.len();
        }
        let mut skeleton = Self {
            transforms: vec![Isometry3::identity(); bodies.len()],
            bodies,
            dof_start,
            q: vec![0.0; ndofs],
            dq: vec![0.0; ndofs],
            limits: vec![(-std::f64::consts::PI, std::f64::consts::PI); ndofs],
        };
        skeleton.update_transforms();
        skeleton
    }

    pub fn bodies(&self) -> &[BodySpec] {
        &self.bodies
    }

    pub fn body_name(&self, body: usize) -> &str {
        &self.bodies[body].name
    }

    /// First dof index owned by a body.
    pub fn dof_start(&self, body: usize) -> usize {
        self.dof_start[body]
    }

    pub fn set_position_limits(&mut self, limits: Vec<(f64, f64)>) -> Result<(), SimError> {
        check_len("limits", self.q.len(), limits.len())?;
        self.limits = limits;
        Ok(())
    }

    /// Semi-implicit Euler: `dq += tau·dt`, then `q += dq·dt`.
    pub fn integrate(&mut self, tau: &[f64], dt: f64) -> Result<(), SimError> {
        check_len("tau", self.dq.len(), tau.len())?;
        for ((q, dq), t) in self.q.iter_mut().zip(&mut self.dq).zip(tau) {
            *dq += t * dt;
            *q += *dq * dt;
        }
        self.update_transforms();
        Ok(())
    }

    fn update_transforms(&mut self) {
        for i in 0..self.bodies.len() {
            let body = &self.bodies[i];
            let parent = body
                .parent
                .filter(|p| *p < i)
                .map_or_else(Isometry3::identity, |p| self.transforms[p]);
            let start = self.dof_start[i];
            let rotation = body
                .axes
                .iter()
                .enumerate()
                .fold(UnitQuaternion::identity(), |acc, (k, axis)| {
                    acc * UnitQuaternion::from_axis_angle(axis, self.q[start + k])
                });
            let joint = Isometry3::from_parts(Translation3::from(body.offset), rotation);
            self.transforms[i] = parent * joint;
        }
    }
}

impl Skeleton for KinematicSkeleton {
    fn ndofs(&self) -> usize {
        self.q.len()
    }

    fn positions(&self) -> Vec<f64> {
        self.q.clone()
    }

    fn velocities(&self) -> Vec<f64> {
        self.dq.clone()
    }

    fn set_positions(&mut self, q: &[f64]) -> Result<(), SimError> {
        check_len("q", self.q.len(), q.len())?;
        self.q.copy_from_slice(q);
        self.update_transforms();
        Ok(())
    }

    fn set_velocities(&mut self, dq: &[f64]) -> Result<(), SimError> {
        check_len("dq", self.dq.len(), dq.len())?;
        self.dq.copy_from_slice(dq);
        Ok(())
    }

    fn position_limits(&self) -> Vec<(f64, f64)> {
        self.limits.clone()
    }

    fn num_bodies(&self) -> usize {
        self.bodies.len()
    }

    fn parent(&self, body: usize) -> Option<usize> {
        self.bodies[body].parent
    }

    fn body_transform(&self, body: usize) -> Isometry3<f64> {
        self.transforms[body]
    }

    fn body_com(&self, body: usize) -> Point3<f64> {
        self.transforms[body] * Point3::from(self.bodies[body].com)
    }
}
