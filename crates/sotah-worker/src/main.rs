mod config;
mod crawl;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use clap::Parser;
use sotah_blobstore::{GcsObjectStore, LocalObjectStore, ManifestStore, ObjectStore};
use sotah_bus::{
    Bus, Code, ComputePricelistHistoriesJob, Envelope, ReceiveComputedPricelistHistories,
    SUBJECT_BOOT, SUBJECT_ITEMS, SUBJECT_OWNERS_QUERY_BY_ITEMS, SUBJECT_PRICE_LIST_HISTORY,
    SUBJECT_REALM_MODIFICATION_DATES, SUBJECT_SESSION_SECRET, SUBJECT_STATUS,
    TOPIC_COMPUTE_PRICELIST_HISTORIES,
};
use sotah_catalog::ItemCatalogue;
use sotah_crawler::CrawlDeps;
use sotah_intake::IntakeDeps;
use sotah_model::Region;
use sotah_pricehistory::PriceHistoryStore;
use sotah_state::{State, Ticker, DEFAULT_TICK_INTERVAL};
use sotah_upstream::UpstreamClient;

use config::{Args, Command};

fn main() -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting tracing default failed");

    let args = Args::parse();
    tracing::info!(?args.command, "starting sotah-worker");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    let result = runtime.block_on(async_main(args));
    runtime.shutdown_timeout(std::time::Duration::from_secs(5));
    result
}

async fn async_main(args: Args) -> anyhow::Result<()> {
    std::fs::create_dir_all(&args.cache_dir).context("creating cache directory")?;

    let regions = args.parse_regions().context("parsing --regions")?;
    let realms = args.parse_realms().context("parsing --realms")?;

    let catalogue = Arc::new(
        ItemCatalogue::open(args.cache_dir.join("items.db")).context("opening item catalogue")?,
    );
    let price_history = Arc::new(PriceHistoryStore::new(args.cache_dir.clone()));

    let bus = Arc::new(
        Bus::connect(&args.nats_host, args.nats_port)
            .await
            .context("connecting to message bus")?,
    );

    let state = Arc::new(State::new(regions.clone(), catalogue.clone(), price_history.clone(), bus.clone()));

    match &args.command {
        Command::Api => run_api(state, bus).await,
        Command::LiveAuctions => run_live_auctions(state, &args, regions, realms, bus).await,
        Command::PricelistHistories => run_pricelist_histories(state, bus).await,
    }
}

async fn run_api(state: Arc<State>, bus: Arc<Bus>) -> anyhow::Result<()> {
    macro_rules! register {
        ($subject:expr, $handler:path) => {{
            let state = state.clone();
            let listener = bus
                .listen($subject, move |payload: Bytes| {
                    let state = state.clone();
                    async move { $handler(&state, &payload).await }
                })
                .await
                .with_context(|| format!("subscribing to {}", $subject))?;
            state.listeners.add($subject, listener).await;
        }};
    }

    register!(SUBJECT_BOOT, sotah_query::boot);
    register!(SUBJECT_STATUS, sotah_query::status);
    register!(SUBJECT_ITEMS, sotah_query::items);
    register!(SUBJECT_PRICE_LIST_HISTORY, sotah_query::price_list_history);
    register!(SUBJECT_OWNERS_QUERY_BY_ITEMS, sotah_query::owners_query_by_items);
    register!(SUBJECT_SESSION_SECRET, sotah_query::session_secret);
    register!(SUBJECT_REALM_MODIFICATION_DATES, sotah_query::realm_modification_dates);

    tracing::info!("api query handlers listening");
    wait_for_shutdown().await;
    state.listeners.stop_all().await;
    Ok(())
}

async fn run_live_auctions(
    state: Arc<State>,
    args: &Args,
    regions: Vec<Region>,
    realms: Vec<sotah_model::Realm>,
    bus: Arc<Bus>,
) -> anyhow::Result<()> {
    let http = reqwest::Client::new();
    let upstream = Arc::new(UpstreamClient::new(http.clone()));

    let object_store: Arc<dyn ObjectStore> = match (&args.gcs_bucket, &args.gcs_bearer_token) {
        (Some(bucket), Some(token)) => Arc::new(GcsObjectStore::new(http, bucket.clone(), token.clone())),
        _ => Arc::new(LocalObjectStore::new(args.cache_dir.join("blobs"))),
    };
    let blobs = Arc::new(ManifestStore::new(object_store));

    let crawl_deps = Arc::new(CrawlDeps {
        upstream,
        blobs,
    });
    let intake_deps = Arc::new(IntakeDeps {
        catalogue: state.catalogue.clone(),
        price_history: state.price_history.clone(),
        bus: Some(bus),
    });

    let mut by_region: HashMap<String, Vec<sotah_model::Realm>> = HashMap::new();
    for realm in realms {
        by_region.entry(realm.region_name.clone()).or_default().push(realm);
    }
    let region_realms = Arc::new(
        regions
            .into_iter()
            .map(|region| {
                let realms = by_region.remove(&region.name).unwrap_or_default();
                (region, realms)
            })
            .collect::<Vec<_>>(),
    );

    let workers = args.crawler_workers;
    let ticker = Ticker::spawn(DEFAULT_TICK_INTERVAL, move || {
        let state = state.clone();
        let crawl_deps = crawl_deps.clone();
        let intake_deps = intake_deps.clone();
        let region_realms = region_realms.clone();
        async move {
            crawl::run_collection_pass(state, crawl_deps, intake_deps, region_realms, workers).await;
        }
    });

    tracing::info!("live-auctions ticker running");
    wait_for_shutdown().await;
    ticker.stop().await;
    Ok(())
}

async fn run_pricelist_histories(state: Arc<State>, bus: Arc<Bus>) -> anyhow::Result<()> {
    let state_for_handler = state.clone();
    let listener = bus
        .listen(TOPIC_COMPUTE_PRICELIST_HISTORIES, move |payload: Bytes| {
            let state = state_for_handler.clone();
            async move { compute_pricelist_histories(&state, &payload).await }
        })
        .await
        .context("subscribing to computePricelistHistories")?;
    state.listeners.add(TOPIC_COMPUTE_PRICELIST_HISTORIES, listener).await;

    tracing::info!("pricelist-histories consumer listening");
    wait_for_shutdown().await;
    state.listeners.stop_all().await;
    Ok(())
}

async fn compute_pricelist_histories(state: &State, payload: &[u8]) -> Envelope {
    let job: ComputePricelistHistoriesJob = match serde_json::from_slice(payload) {
        Ok(job) => job,
        Err(error) => return Envelope::error(Code::MsgJsonParseError, error.to_string()),
    };

    let from = 0;
    let to = i64::MAX / 2;
    match state
        .price_history
        .query(&job.region_name, &job.realm_slug, &job.item_ids, from, to)
    {
        Ok(histories) => {
            let response = ReceiveComputedPricelistHistories {
                region_name: job.region_name,
                realm_slug: job.realm_slug,
                item_ids: job.item_ids,
                histories: histories
                    .into_iter()
                    .map(|(id, entries)| (id, entries.into_iter().collect::<BTreeMap<_, _>>()))
                    .collect(),
            };
            Envelope::ok_gzipped(&response).unwrap_or_else(|e| Envelope::error(Code::GenericError, e.to_string()))
        }
        Err(error) => Envelope::error(Code::GenericError, error.to_string()),
    }
}

async fn wait_for_shutdown() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(error) => tracing::warn!(%error, "failed to listen for shutdown signal"),
    }
}
