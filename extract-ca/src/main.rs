use clap::Parser;
use kubecreds::{
    expand_env, kubeconfig_path, Extraction, Field, Logging, OutputMap, DEFAULT_CA_OUTPUT,
    DEFAULT_KUBECONFIG,
};
use tracing::debug;

/// Extract out certificate authority data from kubeconfig
#[derive(Parser, Debug)]
#[clap(version)]
struct Args {
    /// log level
    #[clap(short = 'l', long, default_value = "info")]
    log_level: String,

    /// kubeconfig file
    #[clap(short = 'k', long, default_value = DEFAULT_KUBECONFIG)]
    kubeconfig: String,

    /// output file
    #[clap(short = 'o', long, default_value = DEFAULT_CA_OUTPUT)]
    output: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let logging = Logging::new(&args.log_level)?;

    logging.scope(|| {
        debug!(version = env!("CARGO_PKG_VERSION"), "starting");

        Extraction {
            kubeconfig: kubeconfig_path(&args.kubeconfig),
            outputs: OutputMap::new().with(Field::Ca, expand_env(&args.output)),
        }
        .run()?;

        Ok(())
    })
}
