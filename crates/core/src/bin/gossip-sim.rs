use clap::Parser;
use gossip_sim::{
    config::{set_logger, ConfigArgs},
    experiment::Experiment,
    report,
    simulation::SimulationRng,
};

fn main() -> anyhow::Result<()> {
    let args = ConfigArgs::parse();
    set_logger(args.log_level);

    let format = args.format;
    let config = args.build()?;
    let rng = match config.seed {
        Some(seed) => SimulationRng::new(seed),
        None => {
            let rng = SimulationRng::from_entropy();
            tracing::info!(seed = rng.seed(), "No seed provided, using a random one");
            rng
        }
    };

    let report = Experiment::new(config, rng).run()?;
    println!("{}", report::render(&report, format)?);
    Ok(())
}
