use crate::FailResult;

use crate::trial::{TrialDir, NewTrialDirArgs};
use crate::ui::cfg_merging::ConfigSources;
use crate::ui::cli_deserialize::CliDeserialize;
use crate::ui::logging::init_global_logger;

use clap::{App, Arg};
use std::ffi::OsStr;
use std::path::PathBuf;

fn wrap_result_main<F>(main: F)
where F: FnOnce() -> FailResult<()>,
{
    main().unwrap_or_else(|e| {
        for cause in e.iter_chain() {
            error!("{}", cause);
        }

        if std::env::var_os("RUST_BACKTRACE") == Some(OsStr::new("1").to_owned()) {
            error!("{}", e.backtrace());
        } else {
            error!("(for a backtrace, try again with RUST_BACKTRACE=1)");
        }
        std::process::exit(1);
    });
}

impl CliDeserialize for NewTrialDirArgs {
    fn _augment_clap_app<'a, 'b>(app: App<'a, 'b>) -> App<'a, 'b> {
        app.args(&[
            Arg::with_name("trial_dir")
                .short("o").long("output").value_name("OUTDIR").takes_value(true)
                .help("output trial directory [default: results/MODEL/METHOD_GRIDTYPE_...]"),
            Arg::with_name("force")
                .short("f").long("force")
                .help("replace existing output directories"),
            Arg::with_name("config")
                .short("c").long("config").value_name("CONFIG")
                .takes_value(true).multiple(true).number_of_values(1)
                .help("\
                    config yaml, provided as either a filepath, or as an embedded literal. \
                    When provided multiple times, later values take precedence. \
                    \n\n\
                    Literals are written as '--config [NESTED_KEY]:VALID_YAML', \
                    where NESTED_KEY is an optional '.'-separated sequence of string keys. \
                    (so `--config max-points:400` is equivalent to `--config :{max-points: 400}`) \
                    Anything containing a ':' is a literal.\
                "),
        ])
    }

    fn _resolve_args(m: &clap::ArgMatches<'_>) -> FailResult<Self> {
        let configs = m.values_of("config").map(|vs| vs.collect::<Vec<_>>()).unwrap_or_default();
        Ok(NewTrialDirArgs {
            config_sources: ConfigSources::resolve_from_args(configs)?,
            err_if_existing: !m.is_present("force"),
            trial_dir: m.value_of("trial_dir").map(PathBuf::from),
        })
    }
}

/// `--threads`, which overrides `num-threads` in the config.
pub struct ThreadArgs(Option<usize>);

impl CliDeserialize for ThreadArgs {
    fn _augment_clap_app<'a, 'b>(app: App<'a, 'b>) -> App<'a, 'b> {
        app.arg(Arg::with_name("threads")
            .long("threads").value_name("N").takes_value(true)
            .help("number of cells to run at once"))
    }

    fn _resolve_args(m: &clap::ArgMatches<'_>) -> FailResult<Self> {
        match m.value_of("threads") {
            None => Ok(ThreadArgs(None)),
            Some(s) => match s.parse() {
                Ok(n) => Ok(ThreadArgs(Some(n))),
                Err(e) => bail!("--threads: {}: {}", s, e),
            },
        }
    }
}

/// Entry point of `asgrid-sweep`.
pub fn asgrid_sweep() {
    wrap_result_main(|| {
        let logfile = init_global_logger()?;

        let (app, de) = CliDeserialize::augment_clap_app({
            App::new("asgrid-sweep")
                .version(env!("CARGO_PKG_VERSION"))
                .about("Integrate a model with active-subspace and sparse-grid methods over a range of budgets.")
        });
        let matches = app.get_matches();
        let (mut dir_args, ThreadArgs(threads)): (NewTrialDirArgs, _) = de.resolve_args(&matches)?;
        if let Some(threads) = threads {
            dir_args.config_sources.push_literal(&format!("num-threads: {}", threads))?;
        }

        let (trial, settings) = TrialDir::create_new(dir_args)?;
        logfile.start(trial.logfile_path())?;
        info!("trial directory: {}", trial.path().display());

        crate::driver::run_sweep(&settings, trial.path())?;
        Ok(())
    });
}
