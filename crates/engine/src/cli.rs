use std::path::PathBuf;

#[derive(Debug, PartialEq)]
pub enum Command {
    Run(Args),
    CheckConfig(Args),
    Version,
    Help,
}

#[derive(Debug, Default, PartialEq)]
pub struct Args {
    pub config_path: Option<PathBuf>,
}

pub const USAGE: &str = "\
Usage: tripwire [OPTIONS]

Options:
  -c, --config <PATH>  Configuration file path (default: $TRIPWIRE_CONFIG)
      --check          Validate configuration and rules, then exit
  -V, --version        Print version
  -h, --help           Print help";

pub fn parse_from<I>(args: I) -> Result<Command, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut parsed = Args::default();
    let mut check = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => return Ok(Command::Version),
            "--help" | "-h" => return Ok(Command::Help),
            "--check" => check = true,
            "--config" | "-c" => {
                let path = args
                    .next()
                    .ok_or_else(|| "--config requires a path argument".to_string())?;
                parsed.config_path = Some(PathBuf::from(path));
            }
            other => return Err(format!("unknown argument '{other}'")),
        }
    }

    Ok(if check {
        Command::CheckConfig(parsed)
    } else {
        Command::Run(parsed)
    })
}
