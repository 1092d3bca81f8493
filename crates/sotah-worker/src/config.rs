use clap::{Parser, Subcommand};

/// The worker's three run modes, resolved from the newer `kingpin`-style
/// entry point per SPEC_FULL.md's Open Question 2.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serves request/reply and topic query handlers (C9).
    Api,
    /// Runs the realm-crawler ticker and intake pipeline (C5/C6).
    #[clap(name = "live-auctions")]
    LiveAuctions,
    /// Listens on `computePricelistHistories` and replies with the
    /// price-history query result for the requested items.
    #[clap(name = "pricelist-histories")]
    PricelistHistories,
}

#[derive(Debug, Parser)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,

    /// NATS broker host (spec.md Section 6).
    #[clap(long, env = "NATS_HOST", default_value = "127.0.0.1")]
    pub nats_host: String,

    /// NATS broker port (spec.md Section 6).
    #[clap(long, env = "NATS_PORT", default_value = "4222")]
    pub nats_port: u16,

    /// Directory holding the item catalogue and price-history shard
    /// files.
    #[clap(long, default_value = "./cache")]
    pub cache_dir: std::path::PathBuf,

    /// Cold-storage (GCS) project id, used only when `--gcs-bucket` is set.
    #[clap(long, env = "PROJECT_ID")]
    pub project_id: Option<String>,

    /// Cold-storage bucket name; when absent, raw snapshots are kept on
    /// local disk under `cache_dir/blobs` instead of GCS.
    #[clap(long, env = "GCP_PROJECT")]
    pub gcs_bucket: Option<String>,

    /// Bearer token used for GCS JSON API calls, out of scope for
    /// credential acquisition itself (spec.md Section 1, "Out of scope").
    #[clap(long, env = "CLIENT_SECRET")]
    pub gcs_bearer_token: Option<String>,

    /// OAuth client id, named collaborator only (spec.md Section 1).
    #[clap(long, env = "CLIENT_ID")]
    pub client_id: Option<String>,

    /// Bounded concurrency for the realm crawler fan-out.
    #[clap(long, default_value = "8")]
    pub crawler_workers: usize,

    /// Comma-separated `name:hostname:primary` region list, e.g.
    /// `us:us.battle.net:true,eu:eu.battle.net:false`.
    #[clap(long, value_delimiter = ',', default_value = "us:us.battle.net:true")]
    pub regions: Vec<String>,

    /// Comma-separated `region:slug:name:timezone` realm list to crawl;
    /// real deployments populate this from upstream's connected-realm
    /// index, which is out of scope here (spec.md Section 1).
    #[clap(long, value_delimiter = ',', default_value = "")]
    pub realms: Vec<String>,
}

impl Args {
    pub fn parse_regions(&self) -> anyhow::Result<Vec<sotah_model::Region>> {
        self.regions
            .iter()
            .map(|entry| {
                let mut parts = entry.splitn(3, ':');
                let name = parts
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("malformed region entry: {entry}"))?;
                let hostname = parts
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("malformed region entry: {entry}"))?;
                let primary = parts.next().unwrap_or("false") == "true";
                Ok(sotah_model::Region {
                    name: name.to_string(),
                    hostname: hostname.to_string(),
                    primary,
                })
            })
            .collect()
    }

    pub fn parse_realms(&self) -> anyhow::Result<Vec<sotah_model::Realm>> {
        self.realms
            .iter()
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let mut parts = entry.splitn(4, ':');
                let region_name = parts
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("malformed realm entry: {entry}"))?;
                let slug = parts
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("malformed realm entry: {entry}"))?;
                let name = parts.next().unwrap_or(slug);
                let timezone = parts.next().unwrap_or("UTC");
                Ok(sotah_model::Realm {
                    region_name: region_name.to_string(),
                    slug: slug.to_string(),
                    name: name.to_string(),
                    timezone: timezone.to_string(),
                    connected_realms: Vec::new(),
                })
            })
            .collect()
    }
}
