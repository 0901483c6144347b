use std::{io, path::PathBuf, thread, time::Instant};

use clap::{Parser, ValueEnum};
use log::{LevelFilter, info};
use rand::{Rng, thread_rng};
#[cfg(feature = "rocksdb")]
use seg_forest::{RocksDbConfig, RocksDbStorage};
use seg_forest::{
    ArrayError, Handle, MemoryDirectory, MemoryNodeStore, NodeStore, TreeError, Value,
    VersionDirectory, VersionedArrays,
};

#[derive(Parser, Debug)]
#[command(
    name = "Benchmark",
    about = "Versioned array benchmark",
    version,
    rename_all = "kebab-case"
)]
pub struct BenchmarkCmd {
    /// Length of the benchmarked array
    #[arg(short = 's', long = "size", default_value = "1000000")]
    size: usize,
    /// Number of point updates
    #[arg(short = 'u', long = "updates", default_value = "10000")]
    updates: usize,
    /// Number of range queries
    #[arg(short = 'q', long = "queries", default_value = "10000")]
    queries: usize,
    /// Number of clones, each followed by one update
    #[arg(short = 'c', long = "clones", default_value = "1000")]
    clones: usize,
    /// Storage backend to use at runtime: memory or rocksdb
    #[arg(long = "storage", value_enum, default_value = "memory")]
    storage: StorageKind,
    /// Path for the benchmark database
    #[arg(short = 'p', long = "path")]
    storage_path: Option<PathBuf>,
    /// Maximum log level
    #[arg(short = 'l', long = "log-level", default_value = "info")]
    log_level: LevelFilter,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum StorageKind {
    Memory,
    Rocksdb,
}

fn main() {
    let args = BenchmarkCmd::parse();
    setup_logger(args.log_level);

    if let Err(err) = run(args) {
        log::error!("benchmark failed: {err}");
        std::process::exit(1);
    }
    info!("Benchmark completed successfully");
}

fn setup_logger(level: LevelFilter) {
    let result = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:?}][{}][{}] {}",
                thread::current().id(),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(io::stdout())
        .apply();
    if let Err(err) = result {
        eprintln!("failed to install logger: {err}");
    }
}

fn run(args: BenchmarkCmd) -> Result<(), ArrayError> {
    assert!(args.size > 0, "`size` must be positive");
    info!(
        "Running benchmark with {} storage",
        match args.storage {
            StorageKind::Memory => "memory",
            StorageKind::Rocksdb => "rocksdb",
        }
    );

    match args.storage {
        StorageKind::Memory => {
            let arrays = VersionedArrays::new(MemoryNodeStore::new(), MemoryDirectory::new());
            benchmark(&arrays, &args)
        },
        StorageKind::Rocksdb => benchmark_rocksdb(&args),
    }
}

#[cfg(feature = "rocksdb")]
fn benchmark_rocksdb(args: &BenchmarkCmd) -> Result<(), ArrayError> {
    let path = args.storage_path.clone().unwrap_or_else(|| PathBuf::from("seg_forest_db"));
    let storage = RocksDbStorage::open(RocksDbConfig::new(path)).map_err(TreeError::from)?;
    let arrays = VersionedArrays::new(storage.clone(), storage.clone());
    benchmark(&arrays, args)?;
    storage.flush().map_err(TreeError::from)?;
    Ok(())
}

#[cfg(not(feature = "rocksdb"))]
fn benchmark_rocksdb(_args: &BenchmarkCmd) -> Result<(), ArrayError> {
    panic!("the binary was built without the `rocksdb` feature");
}

fn benchmark<S: NodeStore, D: VersionDirectory>(
    arrays: &VersionedArrays<S, D>,
    args: &BenchmarkCmd,
) -> Result<(), ArrayError> {
    let handle = construction(arrays, args.size)?;
    update(arrays, handle, args.size, args.updates)?;
    query(arrays, handle, args.size, args.queries)?;
    clone_and_update(arrays, handle, args.size, args.clones)?;
    Ok(())
}

/// Builds an array of `size` random values and returns its handle.
fn construction<S: NodeStore, D: VersionDirectory>(
    arrays: &VersionedArrays<S, D>,
    size: usize,
) -> Result<Handle, ArrayError> {
    info!("Running a construction benchmark:");
    let mut rng = thread_rng();
    let values = (0..size).map(|_| rng.gen_range(-1_000..1_000)).collect::<Vec<Value>>();

    let now = Instant::now();
    let handle = arrays.create_array(&values)?;
    let elapsed = now.elapsed().as_secs_f32();

    let nodes = arrays.forest().store().node_count().map_err(TreeError::from)?;
    info!("Constructed an array of {size} values in {elapsed:.1} seconds ({nodes} nodes)");
    Ok(handle)
}

fn update<S: NodeStore, D: VersionDirectory>(
    arrays: &VersionedArrays<S, D>,
    handle: Handle,
    size: usize,
    updates: usize,
) -> Result<(), ArrayError> {
    info!("Running an update benchmark:");
    let mut rng = thread_rng();
    let mut times = Vec::with_capacity(updates);

    for _ in 0..updates {
        let index = rng.gen_range(0..size);
        let value = rng.gen_range(-1_000..1_000);

        let now = Instant::now();
        arrays.update_array(handle, index, value)?;
        times.push(now.elapsed().as_micros());
    }

    info!(
        "The average update time measured by {updates} updates of an array of {size} values is {:.1} μs",
        average(&times)
    );
    Ok(())
}

fn query<S: NodeStore, D: VersionDirectory>(
    arrays: &VersionedArrays<S, D>,
    handle: Handle,
    size: usize,
    queries: usize,
) -> Result<(), ArrayError> {
    info!("Running a range query benchmark:");
    let mut rng = thread_rng();
    let mut times = Vec::with_capacity(queries);

    for _ in 0..queries {
        let a = rng.gen_range(0..size);
        let b = rng.gen_range(0..size);

        let now = Instant::now();
        arrays.query_array(handle, a.min(b), a.max(b))?;
        times.push(now.elapsed().as_micros());
    }

    info!(
        "The average query time measured by {queries} random ranges over {size} values is {:.1} μs",
        average(&times)
    );
    Ok(())
}

fn clone_and_update<S: NodeStore, D: VersionDirectory>(
    arrays: &VersionedArrays<S, D>,
    handle: Handle,
    size: usize,
    clones: usize,
) -> Result<(), ArrayError> {
    info!("Running a clone benchmark:");
    let mut rng = thread_rng();
    let store = arrays.forest().store();
    let before = store.node_count().map_err(TreeError::from)?;

    let now = Instant::now();
    for _ in 0..clones {
        let clone = arrays.clone_array(handle)?;
        arrays.update_array(clone, rng.gen_range(0..size), rng.gen_range(-1_000..1_000))?;
    }
    let elapsed = now.elapsed().as_secs_f32();

    let written = store.node_count().map_err(TreeError::from)? - before;
    info!(
        "Cloned and updated {clones} arrays in {elapsed:.2} seconds, writing {written} nodes ({:.1} per clone)",
        written as f64 / clones.max(1) as f64
    );
    Ok(())
}

fn average(times: &[u128]) -> f64 {
    if times.is_empty() {
        return 0.0;
    }
    times.iter().sum::<u128>() as f64 / times.len() as f64
}
