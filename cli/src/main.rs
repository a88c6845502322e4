use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use hexflower_core::export::{PAGE_SVG_FILE_NAME, SVG_FILE_NAME};
use hexflower_core::{
    decode_document, encode_document, encode_document_pretty, render_board_svg, render_page_svg,
    BoardState, HexMetrics, LayoutSize, SAVE_FILE_NAME,
};
use hexflower_image::{crop_tile_data_uri, crop_tile_image, CropParams};

mod edit;
mod resolve;

use edit::{EditCommand, EditOutcome};

#[derive(Parser)]
#[command(name = "hexflower-cli", version, about = "Tools for hex flower board files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the row pattern and hex centres of a layout.
    Layout {
        #[arg(long, env = "HEXFLOWER_LAYOUT", default_value = "MEDIUM")]
        size: LayoutSize,
    },
    /// Start an empty board file.
    New {
        #[arg(long, env = "HEXFLOWER_LAYOUT", default_value = "MEDIUM")]
        size: LayoutSize,
        #[arg(short, long, default_value = SAVE_FILE_NAME)]
        output: PathBuf,
    },
    /// Validate a saved board and summarise it.
    Check { file: PathBuf },
    /// Embed every referenced image file into the board as a data URI.
    Inline {
        file: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },
    /// Render the board as SVG.
    Export {
        file: PathBuf,
        /// Centre the board on an A4 landscape page.
        #[arg(long)]
        page: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Crop an image to a square tile image.
    Crop {
        image: PathBuf,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        rotate: i32,
        #[arg(long, default_value_t = 1.0)]
        zoom: f32,
        #[arg(long, default_value_t = 0.5)]
        center_x: f32,
        #[arg(long, default_value_t = 0.5)]
        center_y: f32,
        /// Print a data URI instead of writing a PNG.
        #[arg(long)]
        data_uri: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Change a saved board in place.
    Edit {
        file: PathBuf,
        #[command(subcommand)]
        command: EditCommand,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Layout { size } => print_layout(size),
        Commands::New { size, output } => {
            let state = BoardState::with_layout(size);
            std::fs::write(&output, encode_document(&state)?)?;
            log::info!("created {} board at {}", size, output.display());
        }
        Commands::Check { file } => {
            let state = read_board(&file)?;
            print_summary(&state);
        }
        Commands::Inline {
            file,
            output,
            pretty,
        } => {
            let state = read_board(&file)?;
            let base_dir = file.parent().map(Path::to_path_buf).unwrap_or_default();
            let (state, report) = resolve::inline_board(&state, &base_dir).await;
            for failure in &report.failures {
                log::warn!(
                    "dropped image {} from tiles {:?}: {}",
                    failure.reference,
                    failure.tile_ids,
                    failure.reason
                );
            }
            log::info!(
                "inlined {} image(s), {} failed",
                report.inlined,
                report.failures.len()
            );
            let text = if pretty {
                encode_document_pretty(&state)?
            } else {
                encode_document(&state)?
            };
            write_output(output.as_deref(), text.as_bytes())?;
        }
        Commands::Export { file, page, output } => {
            let state = read_board(&file)?;
            let svg = if page {
                render_page_svg(&state)
            } else {
                render_board_svg(&state)
            };
            let default_name = if page { PAGE_SVG_FILE_NAME } else { SVG_FILE_NAME };
            let output = output.unwrap_or_else(|| PathBuf::from(default_name));
            std::fs::write(&output, svg)?;
            log::info!("wrote {}", output.display());
        }
        Commands::Crop {
            image,
            rotate,
            zoom,
            center_x,
            center_y,
            data_uri,
            output,
        } => {
            let bytes = std::fs::read(&image)?;
            let params = CropParams {
                rotate_quarters: rotate,
                zoom,
                center: (center_x, center_y),
            };
            if data_uri {
                let uri = crop_tile_data_uri(&bytes, &params)?;
                write_output(output.as_deref(), uri.as_bytes())?;
            } else {
                let png = crop_tile_image(&bytes, &params)?;
                let output = output.unwrap_or_else(|| image.with_extension("tile.png"));
                std::fs::write(&output, png)?;
                log::info!("wrote {}", output.display());
            }
        }
        Commands::Edit { file, command } => {
            let state = read_board(&file)?;
            match edit::run(&state, command)? {
                EditOutcome::Changed(next) => {
                    std::fs::write(&file, encode_document(&next)?)?;
                    log::info!("updated {}", file.display());
                }
                EditOutcome::Unchanged(reason) => {
                    log::warn!("nothing changed: {reason}");
                }
            }
        }
    }

    Ok(())
}

fn read_board(path: &Path) -> Result<BoardState, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    decode_document(&text).map_err(|err| format!("failed to load {}: {err}", path.display()).into())
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> std::io::Result<()> {
    match path {
        Some(path) => std::fs::write(path, bytes),
        None => {
            use std::io::Write;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.write_all(b"\n")
        }
    }
}

fn print_layout(size: LayoutSize) {
    let metrics = HexMetrics::default();
    let (width, height) = metrics.board_extent(size);
    println!("layout: {size} ({} cells)", size.cell_count());
    println!("rows: {:?}", size.rows());
    println!("extent: {width:.1} x {height:.1}");
    for cell in size.cell_ids() {
        if let Some((x, y)) = metrics.hex_center(size, cell) {
            println!("  {:>5}  {x:>8.1} {y:>8.1}", cell.to_string());
        }
    }
}

fn print_summary(state: &BoardState) {
    let external = state
        .tiles
        .iter()
        .filter_map(|tile| tile.image.as_deref())
        .filter(|image| !hexflower_core::is_data_uri(image))
        .count();
    println!("layout: {}", state.layout_size);
    println!("tiles: {}", state.tiles.len());
    println!(
        "placed: {} of {} cells",
        state.hexes.occupied_count(),
        state.hexes.len()
    );
    if external > 0 {
        println!("external images: {external} (run `inline` before sharing)");
    }
    for tile in &state.tiles {
        let copies = state.grid_references(&tile.id).len();
        println!("  {:<12} {:<24} on {copies} cell(s)", tile.id, tile.label());
    }
}
