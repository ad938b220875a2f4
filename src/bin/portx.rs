use anyhow::{bail, Result};
use portx::app::App;
use portx::auth::SupabaseGateway;
use portx::callback::{resolve_callback, CallbackRequest};
use portx::config::Config;
use portx::logging;

const USAGE: &str = "usage: portx [callback <url> [--forwarded-host <host>] [--local]]";

fn parse_callback_args(args: &[String]) -> Result<CallbackRequest> {
    let mut url = None;
    let mut forwarded_host = None;
    let mut local_env = false;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--local" => local_env = true,
            "--forwarded-host" => match iter.next() {
                Some(host) => forwarded_host = Some(host.clone()),
                None => bail!("--forwarded-host needs a value\n{USAGE}"),
            },
            other if url.is_none() => url = Some(other.to_string()),
            other => bail!("unexpected argument '{other}'\n{USAGE}"),
        }
    }
    let Some(url) = url else {
        bail!("callback needs a URL\n{USAGE}");
    };
    Ok(CallbackRequest {
        url,
        forwarded_host,
        local_env,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init()?;

    let config = Config::load()?;
    config.validate()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.split_first() {
        None => {
            tracing::info!(auth_url = %config.auth_url, "starting console");
            let mut app = App::new(&config)?;
            app.run().await
        }
        Some((command, rest)) if command == "callback" => {
            let request = parse_callback_args(rest)?;
            let gateway = SupabaseGateway::new(&config)?;
            println!("{}", resolve_callback(&gateway, &request).await);
            Ok(())
        }
        Some((other, _)) => bail!("unknown command '{other}'\n{USAGE}"),
    }
}
