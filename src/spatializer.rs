//! Amplitude panning over a layout of output channels.
//!
//! Each managed channel gets a position in the plane. Every update sets the
//! volume of each channel from its distance to a movable target:
//!
//! ```text
//! volume = roll_off(1 - clamp01(distance / radius)) * master_volume
//! ```
//!
//! Either axis can wrap, so a ring of actuators (a wristband, a belt) has no
//! seam where the target jumps from one end to the other.
//!
//! ```
//! use tactus::{Point, Session, Spatializer};
//! use tactus::backend::VirtualBackend;
//! use tactus::signals::Sine;
//!
//! let (backend, _stepper) = VirtualBackend::manual();
//! let mut session = Session::with_backend(backend);
//! session.open().unwrap();
//!
//! let mut spatializer = Spatializer::bound(&mut session);
//! assert!(spatializer.create_grid(2, 4));
//! spatializer.set_radius(0.5);
//! spatializer.set_target(Point::new(0.0, 0.0));
//! spatializer.play(Sine::new(175.0)).unwrap();
//! ```

use hashbrown::HashMap;
use itertools::Itertools;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::curve::Curve;
use crate::error::Result;
use crate::session::Session;
use crate::signal::Signal;

/// A position in the spatializer's plane. Layouts usually live in `[0, 1]²`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Distance along one axis, the short way around when `wrap > 0`.
fn axis_distance(a: f64, b: f64, wrap: f64) -> f64 {
    let d = (a - b).abs();
    if wrap > 0.0 {
        let d = d % wrap;
        d.min(wrap - d)
    } else {
        d
    }
}

fn distance(a: Point, b: Point, wrap: Point) -> f64 {
    axis_distance(a.x, b.x, wrap.x).hypot(axis_distance(a.y, b.y, wrap.y))
}

/// Drives the volumes of a set of [`Session`] channels from a target position.
///
/// The spatializer borrows its session mutably for as long as it is bound.
/// Dropping it stops its channels and resets their volume and pitch to 1.
pub struct Spatializer<'s> {
    session: Option<&'s mut Session>,
    positions: HashMap<usize, Point>,
    target: Point,
    radius: f64,
    roll_off: Curve,
    wrap: Point,
    volume: f64,
    pitch: f64,
    auto_update: bool,
}

impl<'s> Spatializer<'s> {
    /// An unbound spatializer with the target at `(0.5, 0.5)`, radius 0.25
    /// and linear roll-off.
    pub fn new() -> Self {
        Self {
            session: None,
            positions: HashMap::new(),
            target: Point::new(0.5, 0.5),
            radius: 0.25,
            roll_off: Curve::LINEAR,
            wrap: Point::default(),
            volume: 1.0,
            pitch: 1.0,
            auto_update: true,
        }
    }

    pub fn bound(session: &'s mut Session) -> Self {
        let mut spatializer = Self::new();
        spatializer.session = Some(session);
        spatializer
    }

    /// Unbind from the current session, if any, and drive `session` instead.
    pub fn bind(&mut self, session: &'s mut Session) {
        self.unbind();
        self.session = Some(session);
        self.refresh();
    }

    /// Stop every managed channel, reset its volume and pitch, and let go of
    /// the session. Positions are kept.
    pub fn unbind(&mut self) {
        if let Some(session) = self.session.take() {
            for &channel in self.positions.keys() {
                release(session, channel);
            }
            tracing::debug!(channels = self.positions.len(), "spatializer unbound");
        }
    }

    pub fn is_bound(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_deref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.session.as_deref_mut()
    }

    /// Place `channel` at `position`, adding it to the managed set.
    pub fn set_position(&mut self, channel: usize, position: impl Into<Point>) {
        self.positions.insert(channel, position.into());
        self.refresh();
    }

    pub fn position(&self, channel: usize) -> Option<Point> {
        self.positions.get(&channel).copied()
    }

    pub fn has_channel(&self, channel: usize) -> bool {
        self.positions.contains_key(&channel)
    }

    /// Managed channels in ascending order.
    pub fn channels(&self) -> Vec<usize> {
        self.positions.keys().copied().sorted_unstable().collect()
    }

    pub fn channel_count(&self) -> usize {
        self.positions.len()
    }

    /// Stop managing `channel`. Returns false if it was not managed.
    pub fn remove(&mut self, channel: usize) -> bool {
        if self.positions.remove(&channel).is_none() {
            return false;
        }
        if let Some(session) = self.session.as_deref_mut() {
            release(session, channel);
        }
        true
    }

    /// Stop managing every channel.
    pub fn clear(&mut self) {
        if let Some(session) = self.session.as_deref_mut() {
            for &channel in self.positions.keys() {
                release(session, channel);
            }
        }
        self.positions.clear();
    }

    /// Lay the first `rows * cols` channels of the bound session out on an
    /// evenly spaced grid spanning `[0, 1]²`.
    ///
    /// Returns false, and leaves the layout untouched, if the session has
    /// fewer channels than the grid needs.
    pub fn create_grid(&mut self, rows: usize, cols: usize) -> bool {
        let available = self.session.as_deref().map_or(0, Session::channel_count);
        let needed = rows * cols;
        if needed > available {
            tracing::warn!(rows, cols, available, "grid does not fit the session");
            return false;
        }
        self.clear();
        let spread = |i: usize, n: usize| if n > 1 { i as f64 / (n - 1) as f64 } else { 0.5 };
        for (r, c) in (0..rows).cartesian_product(0..cols) {
            self.positions.insert(r * cols + c, Point::new(spread(c, cols), spread(r, rows)));
        }
        self.refresh();
        true
    }

    pub fn set_target(&mut self, target: impl Into<Point>) {
        self.target = target.into();
        self.refresh();
    }

    pub fn target(&self) -> Point {
        self.target
    }

    /// Distance at which a channel falls silent. Must be positive.
    pub fn set_radius(&mut self, radius: f64) {
        debug_assert!(radius > 0.0, "radius must be positive");
        self.radius = radius.max(f64::MIN_POSITIVE);
        self.refresh();
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn set_roll_off(&mut self, roll_off: Curve) {
        self.roll_off = roll_off;
        self.refresh();
    }

    pub fn roll_off(&self) -> Curve {
        self.roll_off
    }

    /// Wrap interval per axis; 0 leaves an axis unwrapped.
    pub fn set_wrap(&mut self, wrap: impl Into<Point>) {
        let wrap = wrap.into();
        self.wrap = Point::new(wrap.x.max(0.0), wrap.y.max(0.0));
        self.refresh();
    }

    pub fn wrap(&self) -> Point {
        self.wrap
    }

    /// Master volume, applied on top of the roll-off.
    pub fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
        self.refresh();
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Set the pitch of every managed channel.
    ///
    /// Like the other broadcasts, a channel the session lacks does not stop
    /// the rest; the first error is returned afterwards.
    pub fn set_pitch(&mut self, pitch: f64) -> Result<()> {
        self.pitch = pitch;
        let Some(session) = self.session.as_deref_mut() else {
            return Ok(());
        };
        every(self.positions.keys().map(|&channel| session.set_pitch(channel, pitch)))
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    /// Play `signal` on every managed channel.
    pub fn play(&mut self, signal: impl Into<Signal>) -> Result<()> {
        let signal = signal.into();
        let Some(session) = self.session.as_deref_mut() else {
            return Ok(());
        };
        every(self.positions.keys().map(|&channel| session.play(channel, signal.clone())))
    }

    /// Stop every managed channel.
    pub fn stop(&mut self) -> Result<()> {
        let Some(session) = self.session.as_deref_mut() else {
            return Ok(());
        };
        every(self.positions.keys().map(|&channel| session.stop(channel)))
    }

    /// Whether setters recompute volumes immediately. When off, call
    /// [`update`](Self::update) after a batch of changes.
    pub fn auto_update(&mut self, enable: bool) {
        self.auto_update = enable;
    }

    pub fn is_auto_updating(&self) -> bool {
        self.auto_update
    }

    /// The volume `update` would give a channel at `position`.
    pub fn volume_at(&self, position: Point) -> f64 {
        let d = distance(position, self.target, self.wrap);
        self.roll_off.eval(1.0 - (d / self.radius).clamp(0.0, 1.0)) * self.volume
    }

    /// Recompute and send the volume of every managed channel.
    pub fn update(&mut self) -> Result<()> {
        if self.session.is_none() {
            return Ok(());
        }
        let volumes: Vec<(usize, f64)> = self
            .positions
            .iter()
            .map(|(&channel, &position)| (channel, self.volume_at(position)))
            .collect();
        let Some(session) = self.session.as_deref_mut() else {
            return Ok(());
        };
        every(
            volumes
                .into_iter()
                .map(|(channel, volume)| session.set_volume(channel, volume)),
        )
    }

    fn refresh(&mut self) {
        if !self.auto_update {
            return;
        }
        if let Err(e) = self.update() {
            tracing::warn!(error = %e, "spatializer update failed");
        }
    }
}

impl Default for Spatializer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Spatializer<'_> {
    fn drop(&mut self) {
        self.unbind();
    }
}

/// Drive every call to completion and report the first failure.
fn every(results: impl Iterator<Item = Result<()>>) -> Result<()> {
    results.fold(Ok(()), |first, result| first.and(result))
}

fn release(session: &mut Session, channel: usize) {
    let reset = session
        .stop(channel)
        .and_then(|_| session.set_volume(channel, 1.0))
        .and_then(|_| session.set_pitch(channel, 1.0));
    if let Err(e) = reset {
        tracing::debug!(channel, error = %e, "could not reset channel");
    }
}
