use crate::traits::{DynamicalSystem, Scalar, Steppable};
use serde::{Deserialize, Serialize};

/// Explicit (forward) Euler: `y_next = y + dt * f(t, y)`.
pub struct Euler<T: Scalar> {
    dydt: Vec<T>,
}

impl<T: Scalar> Euler<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            dydt: vec![T::zero(); dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for Euler<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T) {
        let t0 = *t;
        system.apply(t0, state, &mut self.dydt);
        for (y, dy) in state.iter_mut().zip(&self.dydt) {
            *y = *y + *dy * dt;
        }
        *t = t0 + dt;
    }
}

/// Classic Runge-Kutta 4th Order Solver
pub struct Rk4<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    tmp: Vec<T>,
}

impl<T: Scalar> Rk4<T> {
    pub fn new(dim: usize) -> Self {
        let z = T::zero();
        Self {
            k1: vec![z; dim],
            k2: vec![z; dim],
            k3: vec![z; dim],
            k4: vec![z; dim],
            tmp: vec![z; dim],
        }
    }

    fn offset(&mut self, state: &[T], stage: Stage, scale: T) {
        let k = match stage {
            Stage::K1 => &self.k1,
            Stage::K2 => &self.k2,
            Stage::K3 => &self.k3,
        };
        for ((tmp, y), ki) in self.tmp.iter_mut().zip(state).zip(k) {
            *tmp = *y + scale * *ki;
        }
    }
}

#[derive(Clone, Copy)]
enum Stage {
    K1,
    K2,
    K3,
}

impl<T: Scalar> Steppable<T> for Rk4<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T) {
        let two = T::one() + T::one();
        let half_dt = dt / two;
        let sixth_dt = dt / (two + two + two);
        let t0 = *t;

        system.apply(t0, state, &mut self.k1);

        self.offset(state, Stage::K1, half_dt);
        system.apply(t0 + half_dt, &self.tmp, &mut self.k2);

        self.offset(state, Stage::K2, half_dt);
        system.apply(t0 + half_dt, &self.tmp, &mut self.k3);

        self.offset(state, Stage::K3, dt);
        system.apply(t0 + dt, &self.tmp, &mut self.k4);

        // y_next = y + dt/6 * (k1 + 2k2 + 2k3 + k4)
        for i in 0..state.len() {
            state[i] = state[i]
                + sixth_dt * (self.k1[i] + two * self.k2[i] + two * self.k3[i] + self.k4[i]);
        }

        *t = t0 + dt;
    }
}

/// Fixed-step integration method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    #[default]
    Euler,
    Rk4,
}

impl Method {
    pub fn build<T: Scalar>(self, dim: usize) -> Stepper<T> {
        match self {
            Method::Euler => Stepper::Euler(Euler::new(dim)),
            Method::Rk4 => Stepper::Rk4(Rk4::new(dim)),
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "euler" => Some(Method::Euler),
            "rk4" => Some(Method::Rk4),
            _ => None,
        }
    }
}

/// A stepper selected at runtime by [`Method`].
pub enum Stepper<T: Scalar> {
    Euler(Euler<T>),
    Rk4(Rk4<T>),
}

impl<T: Scalar> Steppable<T> for Stepper<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T) {
        match self {
            Stepper::Euler(s) => s.step(system, t, state, dt),
            Stepper::Rk4(s) => s.step(system, t, state, dt),
        }
    }
}
