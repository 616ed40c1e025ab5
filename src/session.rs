//! Scoped measurement regions.
//!
//! A [`Session`] opens [`Region`]s, runs their primaries while the caller's
//! work executes, and on close derives the normalized components and records
//! one value per active metric under the region's path.
//!
//! ```ignore
//! use perfnorm::{Config, ComponentRegistry, Session};
//!
//! let mut session = Session::new(Config::default(), ComponentRegistry::with_defaults())?;
//!
//! let mut region = session.start("matvec");
//! multiply(&a, &x, &mut y);
//! region.store((n * n) as u64)?;
//! session.stop(region)?;
//!
//! println!("{}", perfnorm::output::terminal::format_report(&session.report(), session.config()));
//! ```
//!
//! Regions nest: a region started while another is open is recorded under
//! `outer/inner`. Regions must be closed innermost first. A region dropped
//! without being stopped records nothing and no longer counts as open.
//!
//! [`Session::stop`] returns the closed region's values, and
//! [`Session::restart`] closes a region and opens a sibling under a new
//! name, for phase-by-phase printing:
//!
//! ```ignore
//! let mut pd = session.start("init");
//! init(&mut m);
//! let (done, mut pd) = session.restart(pd, "compute")?;
//! println!("{done}");
//! pd.store(repeat * n * n)?;
//! compute(&m, &x, &mut y);
//! println!("{}", session.stop(pd)?);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use serde::Serialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::measurement::{Component, CpuClock, CycleCounter, Measurement, WallClock};
use crate::normalized::Normalized;
use crate::output::terminal::ValueFormat;
use crate::output::Report;
use crate::registry::ComponentRegistry;
use crate::storage::Storage;
use crate::units::TimeUnit;

/// One primary and its normalized dependent, each present only if active.
#[derive(Debug, Default)]
struct Pair<T: Measurement> {
    primary: Option<T>,
    normalized: Option<Normalized<T>>,
}

impl<T: Measurement> Pair<T> {
    fn new(registry: &ComponentRegistry, unit: TimeUnit) -> Self {
        let primary = registry.is_active_for::<T>().then(|| {
            let mut p = T::default();
            p.set_time_unit(unit);
            p
        });
        let normalized = registry
            .is_active_for::<Normalized<T>>()
            .then(Normalized::<T>::new);
        Self {
            primary,
            normalized,
        }
    }

    fn start(&mut self) {
        if let Some(p) = &mut self.primary {
            p.start();
        }
    }

    fn stop(&mut self) {
        if let Some(p) = &mut self.primary {
            p.stop();
        }
    }

    fn store(&mut self, data_size: u64) -> Result<()> {
        match &mut self.normalized {
            Some(n) => n.store(data_size),
            None => Ok(()),
        }
    }

    fn derive(&mut self, verbose: u8) {
        if let Some(n) = &mut self.normalized {
            if verbose > 1 {
                tracing::debug!(
                    data_size = n.data_size(),
                    "deriving {} from {}",
                    Normalized::<T>::label(),
                    T::label()
                );
            }
            if !n.derive(self.primary.as_ref()) {
                tracing::debug!("{} has no primary to derive from", Normalized::<T>::label());
            }
        }
    }

    fn collect(&self, out: &mut Vec<MetricValue>) {
        if let Some(p) = &self.primary {
            out.push(MetricValue {
                label: T::label(),
                unit: p.unit().name,
                description: T::description(),
                value: p.get(),
            });
        }
        if let Some(n) = self.normalized.as_ref().filter(|n| n.is_derived()) {
            out.push(MetricValue {
                label: Normalized::<T>::label(),
                unit: n.display_unit(),
                description: Normalized::<T>::description(),
                value: n.get(),
            });
        }
    }
}

#[derive(Debug, Default)]
struct Bundle {
    wall: Pair<WallClock>,
    cpu: Pair<CpuClock>,
    cycles: Pair<CycleCounter>,
}

impl Bundle {
    fn new(registry: &ComponentRegistry, unit: TimeUnit) -> Self {
        Self {
            wall: Pair::new(registry, unit),
            cpu: Pair::new(registry, unit),
            cycles: Pair::new(registry, unit),
        }
    }

    fn start(&mut self) {
        self.wall.start();
        self.cpu.start();
        self.cycles.start();
    }

    // Reverse of start order so the cheapest counter brackets the others.
    fn stop(&mut self) {
        self.cycles.stop();
        self.cpu.stop();
        self.wall.stop();
    }

    fn store(&mut self, data_size: u64) -> Result<()> {
        self.wall.store(data_size)?;
        self.cpu.store(data_size)?;
        self.cycles.store(data_size)
    }

    fn derive(&mut self, verbose: u8) {
        self.wall.derive(verbose);
        self.cpu.derive(verbose);
        self.cycles.derive(verbose);
    }

    fn collect(&self) -> Vec<MetricValue> {
        let mut out = Vec::new();
        self.wall.collect(&mut out);
        self.cpu.collect(&mut out);
        self.cycles.collect(&mut out);
        out
    }
}

/// One metric value taken from a region when it closed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricValue {
    /// Component label.
    pub label: String,
    /// Display unit name.
    pub unit: &'static str,
    /// Component description.
    pub description: String,
    /// Value in the display unit, normalized for `normalized_*` labels.
    pub value: f64,
}

/// Values of a single region closing, returned by [`Session::stop`].
///
/// Displays as one line using the session's number format:
///
/// ```text
/// >>> solve/compute :  1.250e0 msec wall_clock,  3.125e-4 msec normalized_wall_clock
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct RegionSample {
    /// `/`-joined path of the region.
    pub path: String,
    /// Region name.
    pub name: String,
    /// Nesting depth; 0 for top-level regions.
    pub depth: usize,
    /// Data size the normalized values were divided by.
    pub data_size: u64,
    /// Values in bundle order. Empty for a disabled session.
    pub values: Vec<MetricValue>,
    #[serde(skip)]
    format: ValueFormat,
}

impl RegionSample {
    /// Value recorded for `label`, if that component was active.
    pub fn value(&self, label: &str) -> Option<f64> {
        self.values.iter().find(|v| v.label == label).map(|v| v.value)
    }
}

impl fmt::Display for RegionSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ">>> {} :", self.path)?;
        for (i, v) in self.values.iter().enumerate() {
            let sep = if i == 0 { "" } else { "," };
            write!(f, "{sep} {} {} {}", self.format.apply(v.value), v.unit, v.label)?;
        }
        Ok(())
    }
}

/// An open measurement region, returned by [`Session::start`].
///
/// Close it with [`Session::stop`].
#[derive(Debug)]
#[must_use = "a region records nothing until passed to Session::stop"]
pub struct Region {
    id: u64,
    _guard: Arc<()>,
    name: String,
    path: String,
    depth: usize,
    data_size: u64,
    active: bool,
    bundle: Bundle,
}

impl Region {
    /// Set the data size used by every normalized component of this region.
    ///
    /// # Errors
    ///
    /// [`Error::ZeroDataSize`] for 0; the previous size is kept.
    pub fn store(&mut self, data_size: u64) -> Result<&mut Self> {
        if data_size == 0 {
            tracing::warn!(region = %self.path, "rejecting data size 0");
            return Err(Error::ZeroDataSize);
        }
        self.bundle.store(data_size)?;
        self.data_size = data_size;
        Ok(self)
    }

    /// Region name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `/`-joined path from the outermost open region.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Current data size (1 unless stored).
    pub fn data_size(&self) -> u64 {
        self.data_size
    }

    /// Whether the region records anything when closed.
    pub fn is_active(&self) -> bool {
        self.active
    }
}

static NEXT_REGION_ID: AtomicU64 = AtomicU64::new(0);

/// Open-region entry; `guard` dies with the caller's [`Region`].
#[derive(Debug)]
struct Frame {
    id: u64,
    path: String,
    guard: Weak<()>,
}

impl Frame {
    fn is_live(&self) -> bool {
        self.guard.strong_count() > 0
    }
}

/// Collection context: configuration, registry and recorded results.
#[derive(Debug)]
pub struct Session {
    config: Config,
    registry: ComponentRegistry,
    storage: Storage,
    stack: Vec<Frame>,
}

impl Session {
    /// Create a session.
    ///
    /// If `config.components` is non-empty the registry is restricted to
    /// those labels.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] if the config fails validation, or
    /// [`Error::UnknownComponent`] if it names an unregistered component.
    pub fn new(config: Config, mut registry: ComponentRegistry) -> Result<Self> {
        config.validate()?;
        if !config.components.is_empty() {
            registry.restrict_to(&config.components)?;
        }
        Ok(Self {
            config,
            registry,
            storage: Storage::new(),
            stack: Vec::new(),
        })
    }

    /// Session with [`Config::from_env`] and the default registry.
    pub fn with_defaults() -> Result<Self> {
        Self::new(Config::from_env(), ComponentRegistry::with_defaults())
    }

    /// Open a region nested inside the innermost open one and start its primaries.
    pub fn start(&mut self, name: &str) -> Region {
        let id = NEXT_REGION_ID.fetch_add(1, Ordering::Relaxed);
        let guard = Arc::new(());

        if !self.config.enabled {
            return Region {
                id,
                _guard: guard,
                name: name.to_string(),
                path: name.to_string(),
                depth: 0,
                data_size: 1,
                active: false,
                bundle: Bundle::default(),
            };
        }

        self.prune();
        let depth = self.stack.len();
        let path = match self.stack.last() {
            Some(parent) => format!("{}/{name}", parent.path),
            None => name.to_string(),
        };
        self.stack.push(Frame {
            id,
            path: path.clone(),
            guard: Arc::downgrade(&guard),
        });
        tracing::debug!(region = %path, depth, "region start");

        let mut bundle = Bundle::new(&self.registry, self.config.timing_unit);
        bundle.start();
        Region {
            id,
            _guard: guard,
            name: name.to_string(),
            path,
            depth,
            data_size: 1,
            active: true,
            bundle,
        }
    }

    /// Close `region`: stop its primaries, derive, and record.
    ///
    /// Returns the values recorded for this closing.
    ///
    /// # Errors
    ///
    /// [`Error::RegionMismatch`] if `region` is not the innermost open
    /// region. Nothing is recorded and `region` stops counting as open;
    /// regions opened inside it stay open and can still be closed.
    /// [`Error::NoOpenRegion`] if `region` is not open in this session.
    pub fn stop(&mut self, mut region: Region) -> Result<RegionSample> {
        region.bundle.stop();
        if !region.active {
            return Ok(self.sample(&region, Vec::new()));
        }

        self.prune();
        let innermost = self.stack.len().checked_sub(1);
        match self.stack.iter().rposition(|f| f.id == region.id) {
            Some(i) if Some(i) == innermost => {
                self.stack.pop();
            }
            Some(i) => {
                let expected = self
                    .stack
                    .last()
                    .map_or_else(String::new, |f| f.path.clone());
                self.stack.remove(i);
                tracing::warn!(expected = %expected, found = %region.path, "region closed out of order");
                return Err(Error::RegionMismatch {
                    expected,
                    found: region.path,
                });
            }
            None => return Err(Error::NoOpenRegion(region.path)),
        }

        region.bundle.derive(self.config.verbose);
        let values = region.bundle.collect();
        let rec = self.storage.entry(&region.path, &region.name, region.depth);
        rec.laps += 1;
        for v in &values {
            rec.record(&v.label, v.unit, &v.description, v.value)?;
        }

        tracing::debug!(region = %region.path, data_size = region.data_size, "region stop");
        Ok(self.sample(&region, values))
    }

    /// Close `region` and open a sibling named `name` in its place.
    ///
    /// The new region starts with a data size of 1.
    ///
    /// # Errors
    ///
    /// Any error from [`stop`](Self::stop); no new region is opened then.
    pub fn restart(&mut self, region: Region, name: &str) -> Result<(RegionSample, Region)> {
        let sample = self.stop(region)?;
        let next = self.start(name);
        Ok((sample, next))
    }

    /// Run `f` inside a region normalized to `data_size`.
    ///
    /// # Errors
    ///
    /// [`Error::ZeroDataSize`] before running `f` if `data_size` is 0, or
    /// any error from [`stop`](Self::stop).
    pub fn measure<F, R>(&mut self, name: &str, data_size: u64, f: F) -> Result<R>
    where
        F: FnOnce() -> R,
    {
        if data_size == 0 {
            return Err(Error::ZeroDataSize);
        }
        let mut region = self.start(name);
        region.store(data_size)?;
        let out = f();
        self.stop(region)?;
        Ok(out)
    }

    /// Paths of regions currently open, outermost first.
    pub fn open_regions(&self) -> impl Iterator<Item = &str> {
        self.stack
            .iter()
            .filter(|f| f.is_live())
            .map(|f| f.path.as_str())
    }

    /// Session configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Component registry.
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Recorded results.
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Consume the session and return its results.
    pub fn into_storage(self) -> Storage {
        self.storage
    }

    /// Report of everything recorded so far.
    pub fn report(&self) -> Report {
        Report::new(&self.storage, &self.config, 1)
    }

    // Forget regions whose handle was dropped without being stopped.
    fn prune(&mut self) {
        self.stack.retain(|f| {
            if !f.is_live() {
                tracing::warn!(region = %f.path, "region dropped without stop");
            }
            f.is_live()
        });
    }

    fn sample(&self, region: &Region, values: Vec<MetricValue>) -> RegionSample {
        RegionSample {
            path: region.path.clone(),
            name: region.name.clone(),
            depth: region.depth,
            data_size: region.data_size,
            values,
            format: ValueFormat::from_config(&self.config),
        }
    }
}
