/**
 * Minimal command-line harness for the CloudRun client.
 *
 *   cargo run -p cloudrun_demo -- <url> <port> <token> <module> [name=value]...
 *
 * Flags (anywhere after the positional arguments):
 *   --file name=path   embed a file as a base64 field
 *   --handler name     call a custom handler instead of a module
 *   --insecure         skip TLS certificate verification
 *   --timeout secs     per-call timeout
 *
 * `value` is parsed as JSON when possible (`n=3`, `flag=true`), otherwise
 * sent as a string. Set `RUST_LOG=debug` to see the dispatch logs.
 */
use std::process::ExitCode;
use std::time::Duration;

use serde_json::Value;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: cloudrun_demo <url> <port> <token> <module> [name=value]... \
                     [--file name=path]... [--handler name] [--insecure] [--timeout secs]";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(std::env::args().skip(1).collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("[demo] {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), String> {
    let mut positional = Vec::new();
    let mut files = Vec::new();
    let mut handler = None;
    let mut config = cloudrun::Config::default();

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--file" => files.push(iter.next().ok_or(USAGE)?),
            "--handler" => handler = Some(iter.next().ok_or(USAGE)?),
            "--insecure" => config.verify_tls = false,
            "--timeout" => {
                let secs: u64 = iter
                    .next()
                    .ok_or(USAGE)?
                    .parse()
                    .map_err(|e| format!("invalid --timeout: {e}"))?;
                config.timeout = Duration::from_secs(secs);
            }
            _ => positional.push(arg),
        }
    }

    if positional.len() < 4 {
        return Err(USAGE.into());
    }
    let fields = positional.split_off(4);
    let [url, port, token, module]: [String; 4] =
        positional.try_into().map_err(|_| USAGE.to_string())?;
    let port: u16 = port.parse().map_err(|e| format!("invalid port: {e}"))?;

    /*
     * Assemble a prepared request from the remaining arguments.
     */
    let mut request = cloudrun::Request::new(module);
    for field in fields {
        let (name, value) = split_pair(&field)?;
        let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.into()));
        request.set_data(name, value);
    }
    for file in files {
        let (name, path) = split_pair(&file)?;
        request
            .set_data_from_path(name, path)
            .map_err(|e| format!("cannot read {path}: {e}"))?;
    }

    let conn = cloudrun::connect(cloudrun::Options {
        url,
        port,
        token,
        config,
    });

    let result = match handler {
        Some(handler) => conn.send_custom_request(&handler, request.data()),
        None => conn.send_prepared_request(&request),
    };

    match result {
        Ok(response) => {
            println!("[demo] HTTP {}", response.status_code());
            println!(
                "{}",
                serde_json::to_string_pretty(response.body()).map_err(|e| e.to_string())?
            );
            Ok(())
        }
        Err(cloudrun::Error::Protocol(err)) => {
            Err(format!("server rejected the call (code {}): {}", err.code(), err.message()))
        }
        Err(err) if err.is_retryable() => Err(format!("{err} (try again later)")),
        Err(err) => Err(err.to_string()),
    }
}

fn split_pair(arg: &str) -> Result<(&str, &str), String> {
    arg.split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{arg}'"))
}
