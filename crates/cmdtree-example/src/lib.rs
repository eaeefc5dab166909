//! The `cmdtree-demo` command tree.
//!
//! ```text
//! cmdtree-demo                        prints Hello!
//! cmdtree-demo get [url]              fetches url (default https://example.com)
//! cmdtree-demo greet [name] [count]   greets name, count times
//! cmdtree-demo post [-v] stdin        posts standard input
//! cmdtree-demo post [-v] random       posts a random number
//! ```
//!
//! Every command accepts `-v`/`--verbose` right after its name. The `post`
//! commands ping the server before running.
//!
//! Network access goes through [`Transport`] so the tree can be exercised
//! without one.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use cmdtree::{middleware, BuildError, Context, Error, Router};
use cmdtree_middleware::{log_args, parsed, span, Args, Positionals};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

/// Where requests go unless a command says otherwise.
pub const DEFAULT_URL: &str = "https://example.com";

/// Flags accepted by every command.
#[derive(Debug, Clone, Parser)]
#[command(name = "cmdtree-demo")]
pub struct Global {
    /// Print what is happening
    #[arg(short, long)]
    pub verbose: bool,
}

/// The HTTP operations the commands need.
///
/// Both calls return the response status line, e.g. `200 OK`.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> anyhow::Result<String>;
    fn post(&self, url: &str, body: String) -> anyhow::Result<String>;
}

/// [`Transport`] over a blocking reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Requests time out after one second.
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(1)).build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> anyhow::Result<String> {
        let response = self.client.get(url).send()?;
        Ok(response.status().to_string())
    }

    fn post(&self, url: &str, body: String) -> anyhow::Result<String> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "text/plain")
            .body(body)
            .send()?;
        Ok(response.status().to_string())
    }
}

/// Builds the demo command tree.
pub fn router(transport: Arc<dyn Transport>) -> Result<Router, BuildError> {
    let get_transport = Arc::clone(&transport);
    let stdin_transport = Arc::clone(&transport);
    let random_transport = Arc::clone(&transport);

    Router::builder()
        .middleware(span())
        .middleware(log_args())
        .middleware(parsed::<Global>())
        .route_fn("", |ctx| {
            ctx.println("Hello!");
            Ok(())
        })
        .scope(|s| {
            s.middleware(Args::new().string("url", DEFAULT_URL, "address to fetch"))
                .route_fn("get", move |ctx| get(get_transport.as_ref(), &ctx))
        })
        .scope(|s| {
            s.middleware(
                Args::new()
                    .string("name", "World", "name to greet")
                    .int("count", 1, "number of times to greet"),
            )
            .route_fn("greet", greet)
        })
        .branch("post", |post| {
            post.middleware(ping(transport))
                .route_fn("stdin", move |ctx| {
                    post_stdin(stdin_transport.as_ref(), &ctx)
                })
                .route_fn("random", move |ctx| {
                    post_random(random_transport.as_ref(), &ctx)
                })
        })
        .build()
}

fn greet(ctx: Context) -> anyhow::Result<()> {
    let args = ctx.extensions().get_required::<Positionals>()?;
    let name = args.str("name").unwrap_or("World");
    for _ in 0..args.int("count").unwrap_or(1) {
        ctx.println(format!("Hello, {name}!"));
    }
    Ok(())
}

fn get(transport: &dyn Transport, ctx: &Context) -> anyhow::Result<()> {
    let args = ctx.extensions().get_required::<Positionals>()?;
    let url = args.str("url").unwrap_or(DEFAULT_URL);

    let status = transport
        .get(url)
        .inspect_err(|_| ctx.eprintln("Didn't get it."))?;
    ctx.println(format!("Got it! Response: {status}"));
    Ok(())
}

fn post_stdin(transport: &dyn Transport, ctx: &Context) -> anyhow::Result<()> {
    let body = ctx.input().read_to_string()?;

    let status = transport
        .post(DEFAULT_URL, body)
        .inspect_err(|_| ctx.eprintln("Didn't post stdin."))?;
    ctx.println(format!("Posted stdin! Response: {status}"));
    Ok(())
}

fn post_random(transport: &dyn Transport, ctx: &Context) -> anyhow::Result<()> {
    let number = fastrand::u64(..);
    ctx.println(format!("Random number is {number}"));

    let status = transport
        .post(DEFAULT_URL, number.to_string())
        .inspect_err(|_| ctx.eprintln("Didn't post the random number."))?;
    ctx.println(format!("Posted the random number! Response: {status}"));
    Ok(())
}

/// Checks the network before running the rest of the chain.
fn ping(transport: Arc<dyn Transport>) -> impl cmdtree::Middleware {
    middleware::from_fn(move |ctx, next| {
        let verbose = ctx.extensions().get::<Global>().is_some_and(|g| g.verbose);
        if verbose {
            ctx.println("Pinging!");
        }
        transport.get(DEFAULT_URL).map_err(|err| {
            debug!(error = %err, "ping failed");
            Error::handler(err)
        })?;
        next.run(ctx)
    })
}
