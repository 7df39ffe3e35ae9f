use clap::{Arg, Command};
use css_fingerprint::settings::ServerSettings;
use std::path::PathBuf;
use std::process;

fn build_cli() -> Command {
  Command::new("css-fingerprint")
    .about("Serve a script-free fingerprinting page and record the probe requests it triggers")
    .arg(
      Arg::new("config")
        .short('c')
        .long("config")
        .value_parser(clap::value_parser!(PathBuf))
        .help("Settings file (JSON)"),
    )
    .arg(Arg::new("bind").long("bind").help("Address to listen on"))
    .arg(
      Arg::new("port")
        .short('p')
        .long("port")
        .value_parser(clap::value_parser!(u16))
        .help("Port to listen on"),
    )
    .arg(
      Arg::new("database")
        .long("database")
        .value_parser(clap::value_parser!(PathBuf))
        .help("SQLite database path, or :memory: to keep visits in memory"),
    )
    .arg(
      Arg::new("base-url")
        .long("base-url")
        .help("Prefix for every URL embedded in the probe page"),
    )
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
  env_logger::Builder::from_default_env()
    .filter_level(log::LevelFilter::Info)
    .parse_default_env()
    .format_timestamp_millis()
    .init();

  let matches = build_cli().get_matches();

  let config = matches.get_one::<PathBuf>("config").map(PathBuf::as_path);
  let mut settings = match ServerSettings::load(config) {
    Ok(settings) => settings,
    Err(e) => {
      log::error!("{e}");
      process::exit(1);
    }
  };
  settings.apply_env();

  if let Some(bind) = matches.get_one::<String>("bind") {
    settings.bind_address = bind.clone();
  }
  if let Some(port) = matches.get_one::<u16>("port") {
    settings.port = *port;
  }
  if let Some(database) = matches.get_one::<PathBuf>("database") {
    settings.database_path = Some(database.clone());
  }
  if let Some(base_url) = matches.get_one::<String>("base-url") {
    settings.base_url = base_url.clone();
  }

  if let Err(e) = css_fingerprint::run_server(settings).await {
    log::error!("Server failed: {e}");
    process::exit(1);
  }
}
