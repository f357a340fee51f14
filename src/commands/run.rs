//! Channel simulation run

use anyhow::{Context, Result};
use bdfext_core::prelude::*;
use bdfext_types::{KrylovMethod, NoiseSettings, Preconditioner, RunSettings};
use clap::Args;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Run arguments
///
/// Flags override the values loaded from `--config`.
#[derive(Args)]
pub struct RunArgs {
    /// JSON settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// BDF/EXT order (1-3)
    #[arg(short = 'k', long)]
    pub order: Option<usize>,

    /// Time step
    #[arg(long)]
    pub dt: Option<f64>,

    /// Simulated duration
    #[arg(short = 't', long, conflicts_with = "steps")]
    pub duration: Option<f64>,

    /// Number of steps (instead of a duration)
    #[arg(long)]
    pub steps: Option<usize>,

    /// Stabilization scheme (none, supg, gls)
    #[arg(long)]
    pub stabilization: Option<String>,

    /// Relative tolerance of the iterative solver
    #[arg(long)]
    pub rtol: Option<f64>,

    /// Krylov method (preonly, bicgstab)
    #[arg(long)]
    pub krylov: Option<KrylovMethod>,

    /// Preconditioner (lu, jacobi, fieldsplit, none)
    #[arg(long)]
    pub preconditioner: Option<Preconditioner>,

    /// Length of the generated noise schedule (defaults to the step count)
    #[arg(long)]
    pub noise_samples: Option<usize>,

    /// Standard deviation of the forcing noise
    #[arg(long)]
    pub noise_std: Option<f64>,

    /// Low-pass cutoff frequency of the forcing noise
    #[arg(long)]
    pub noise_cutoff: Option<f64>,

    /// Noise seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Grid nodes along the channel
    #[arg(long)]
    pub nodes: Option<usize>,

    /// Reynolds number
    #[arg(long)]
    pub reynolds: Option<f64>,

    /// Proportional gain on the outlet traction (no control when absent)
    #[arg(long)]
    pub control_gain: Option<f64>,

    /// Log observations every N steps
    #[arg(long, default_value = "10")]
    pub report_every: usize,
}

impl RunArgs {
    fn settings(&self) -> Result<RunSettings> {
        let mut settings = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                serde_json::from_str::<RunSettings>(&text)
                    .with_context(|| format!("Failed to parse config file {}", path.display()))?
            }
            None => RunSettings::default(),
        };

        let integrator = &mut settings.integrator;
        if let Some(order) = self.order {
            integrator.order = order;
        }
        if let Some(dt) = self.dt {
            integrator.dt = dt;
        }
        if let Some(name) = &self.stabilization {
            integrator.stabilization = name.clone();
        }
        if let Some(rtol) = self.rtol {
            integrator.solver.rtol = rtol;
        }
        if let Some(krylov) = self.krylov {
            integrator.solver.krylov = krylov;
        }
        if let Some(preconditioner) = self.preconditioner {
            integrator.solver.preconditioner = preconditioner;
        }

        let noise = &mut settings.noise;
        if self.noise_samples.is_some() {
            noise.samples = self.noise_samples;
        }
        if let Some(std_dev) = self.noise_std {
            noise.std_dev = std_dev;
        }
        if self.noise_cutoff.is_some() {
            noise.cutoff = self.noise_cutoff;
        }
        if self.seed.is_some() {
            noise.seed = self.seed;
        }

        if let Some(nodes) = self.nodes {
            settings.channel.nodes = nodes;
        }
        if let Some(reynolds) = self.reynolds {
            settings.channel.reynolds = reynolds;
        }
        if let Some(duration) = self.duration {
            settings.duration = duration;
        }
        Ok(settings)
    }
}

fn build_noise(settings: &NoiseSettings, len: usize, dt: f64) -> Result<NoiseSchedule> {
    let schedule = if settings.std_dev == 0.0 {
        NoiseSchedule::zeros(len)
    } else if let Some(cutoff) = settings.cutoff {
        NoiseSchedule::filtered(len, dt, cutoff, settings.std_dev, settings.seed)?
    } else {
        NoiseSchedule::white(len, settings.std_dev, settings.seed)?
    };
    Ok(schedule)
}

pub fn execute(args: RunArgs) -> Result<()> {
    let settings = args.settings()?;
    let dt = settings.integrator.dt;

    let mut channel = ChannelFlow::new(&settings.channel);
    info!(
        nodes = channel.nodes(),
        reynolds = settings.channel.reynolds,
        u_inf = settings.channel.u_inf,
        "Channel initialized"
    );

    // An invalid dt plans zero steps; the controller reports it below
    let steps = args.steps.unwrap_or_else(|| steps_for(settings.duration, dt));
    let noise_len = settings.noise.samples.unwrap_or(steps);
    let noise = build_noise(&settings.noise, noise_len, dt)
        .context("Failed to generate noise schedule")?;

    let mut controller =
        StepController::new(&settings.integrator, DenseChannelSolver::new(), noise, &channel)
            .context("Failed to construct step controller")?;

    let gain = args.control_gain;
    let policy = |_t: f64, domain: &ChannelFlow| {
        gain.map(|g| vec![-g * domain.collect_observations().1])
    };

    let report_every = args.report_every.max(1);
    let mut report = |step: usize, t: f64, domain: &ChannelFlow| {
        if (step + 1) % report_every == 0 {
            let (inlet, outlet) = domain.collect_observations();
            info!(
                step = step + 1,
                t,
                inlet_traction = inlet,
                outlet_traction = outlet,
                control = domain.control(),
                "Observation"
            );
        }
    };

    let start = Instant::now();
    let mut observers: [&mut dyn StepObserver<ChannelFlow>; 1] = [&mut report];
    let summary = controller
        .run(&mut channel, steps, policy, &mut observers)
        .context("Simulation failed")?;

    let (inlet, outlet) = channel.collect_observations();
    info!(
        steps = summary.steps,
        t = summary.t,
        order = summary.final_order,
        solves = controller.backend().solves(),
        inlet_traction = inlet,
        outlet_traction = outlet,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Run complete"
    );
    Ok(())
}
