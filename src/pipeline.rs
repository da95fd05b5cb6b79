use crate::assembly_graph::{GraphIndex, InputGraph};
use crate::components::{split_components, Component};
use crate::error::Result;
use crate::hierarchy::PatternHierarchyBuilder;
use crate::layout::{LayoutProvider, NoLayout, PrecomputedLayout};
use crate::pattern_detection::detect_patterns;
use crate::store::{PersistedComponent, PersistedStore, StoreMetadata};
use clap::Parser;
use rayon::prelude::*;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

#[derive(Parser, Debug, Clone)]
#[command(name = "asmscope", version, about = "Structural pattern detection for assembly graphs")]
pub struct Args {
    /// Input assembly graph (JSON)
    pub input: String,

    /// Output store (JSON)
    pub output: String,

    /// Precomputed component layouts (JSON keyed by size rank)
    #[arg(short, long)]
    pub layout: Option<String>,

    /// Number of threads
    #[arg(short, long, default_value = "1")]
    pub threads: usize,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Settings for [`run_asmscope`] when called as a library
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub input: String,
    pub output: String,
    pub layout: Option<String>,
    pub threads: usize,
}

impl From<&Args> for PipelineOptions {
    fn from(args: &Args) -> Self {
        PipelineOptions {
            input: args.input.clone(),
            output: args.output.clone(),
            layout: args.layout.clone(),
            threads: args.threads,
        }
    }
}

pub fn load_input_graph<P: AsRef<Path>>(path: P) -> Result<GraphIndex> {
    let file = File::open(path)?;
    let input: InputGraph = serde_json::from_reader(BufReader::new(file))?;
    GraphIndex::from_input(&input)
}

fn process_component(component: &Component, layout: &dyn LayoutProvider) -> Result<PersistedComponent> {
    let detection = detect_patterns(&component.graph)?;
    let forest =
        PatternHierarchyBuilder::new(detection.graph.node_count(), &detection.patterns).build()?;
    let geometry = layout.layout_component(component.size_rank, &detection.graph, &forest)?;
    debug!(
        rank = component.size_rank,
        nodes = detection.graph.node_count(),
        patterns = forest.len(),
        laid_out = geometry.is_some(),
        "processed component"
    );
    Ok(PersistedComponent::from_parts(
        component.size_rank,
        &detection.graph,
        &forest,
        geometry,
    ))
}

/// Split `graph` into components and detect, order and lay out the
/// patterns of each one. Components are processed in parallel.
pub fn build_store(
    graph: &GraphIndex,
    metadata: StoreMetadata,
    layout: &dyn LayoutProvider,
) -> Result<PersistedStore> {
    let components = split_components(graph)?;
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        components = components.len(),
        "split input graph"
    );
    let persisted = components
        .par_iter()
        .map(|c| process_component(c, layout))
        .collect::<Result<Vec<_>>>()?;
    Ok(PersistedStore::new(metadata, persisted))
}

/// Read the input graph, build the store and write it out
pub fn run_asmscope(options: &PipelineOptions) -> Result<PersistedStore> {
    // Only initialize thread pool if not already initialized
    let _ = rayon::ThreadPoolBuilder::new()
        .num_threads(options.threads)
        .build_global();

    let graph = load_input_graph(&options.input)?;
    let metadata = StoreMetadata {
        filename: Path::new(&options.input)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| options.input.clone()),
        filetype: "json".to_string(),
    };

    let store = match &options.layout {
        Some(path) => build_store(&graph, metadata, &PrecomputedLayout::from_json_file(path)?)?,
        None => build_store(&graph, metadata, &NoLayout)?,
    };
    store.write_json(&options.output)?;
    info!(
        output = %options.output,
        components = store.counts.components,
        patterns = store.components.iter().map(|c| c.patterns.len()).sum::<usize>(),
        "store written"
    );
    Ok(store)
}
