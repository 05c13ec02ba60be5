//! [`Tracker`]: the handle the handlers and the batch runner work through.

use std::sync::Arc;

use flightwatch_core::{
  provider::{FlightDataProvider, WeatherProvider},
  store::FlightStore,
};

use crate::batch::DrainMode;

/// Reference-counted store and provider handles plus the batch drain mode.
///
/// Cloning is cheap; batch tasks each hold their own clone.
pub struct Tracker<S, F, W> {
  pub(crate) store:   Arc<S>,
  pub(crate) flights: Arc<F>,
  pub(crate) weather: Arc<W>,
  pub(crate) drain:   DrainMode,
}

impl<S, F, W> Clone for Tracker<S, F, W> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      flights: Arc::clone(&self.flights),
      weather: Arc::clone(&self.weather),
      drain:   self.drain,
    }
  }
}

impl<S, F, W> Tracker<S, F, W>
where
  S: FlightStore + 'static,
  F: FlightDataProvider + 'static,
  W: WeatherProvider + 'static,
{
  pub fn new(store: Arc<S>, flights: Arc<F>, weather: Arc<W>, drain: DrainMode) -> Self {
    Self { store, flights, weather, drain }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn drain_mode(&self) -> DrainMode { self.drain }
}
