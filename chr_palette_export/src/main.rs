use anyhow::{bail, Context};
use chr_palette::{
    export_all_frames, find_icon_pairs, remap_icon, AssetTree, Category, Character, Diagnostic,
    EditRequest, ExportSettings, JobTier, PaletteStore, ReferenceIcon, Roster, SelectModifier,
    Session, SessionConfig,
};
use clap::{Parser, Subcommand};
use std::{fs, path::PathBuf};

#[derive(Parser, Debug)]
#[clap(about = "Compose character palettes and export frames, palettes and icons")]
struct Opts {
    /// The session configuration, as toml
    #[clap(short, long)]
    config: PathBuf,
    /// A toml list of `[[character]]` with `id`, `name` and `tier`
    #[clap(short, long)]
    roster: Option<PathBuf>,
    /// Job tier of the character, used when it isn't in the roster
    #[clap(long, default_value = "3")]
    tier: u8,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export one frame, in the format set in the configuration
    Render {
        #[clap(short, long, default_value = "0")]
        frame: usize,
        output: PathBuf,
    },
    /// Write the 768 bytes of the composed palette
    Palette { output: PathBuf },
    /// Export every frame of the character
    Batch {
        output: PathBuf,
        /// Stop after this many frames
        #[clap(long)]
        limit: Option<usize>,
    },
    /// Recolor every icon of a directory with the layer of a fashion category
    Icon {
        category: String,
        icons: PathBuf,
        output: PathBuf,
    },
    /// Set palette indices of a layer to a color, and save it in the custom palettes
    Recolor {
        category: String,
        /// First index to recolor
        index: usize,
        color: String,
        /// Last index to recolor, for a range
        #[clap(long)]
        to: Option<usize>,
        /// Save under another name
        #[clap(long)]
        name: Option<String>,
    },
}

fn report(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("warning: {}", diagnostic);
    }
}

fn resolve_character(opts: &Opts, config: &SessionConfig) -> anyhow::Result<Character> {
    if let Some(roster_path) = &opts.roster {
        let text = fs::read_to_string(roster_path)
            .with_context(|| format!("can't read the roster at {:?}", roster_path))?;
        let roster = Roster::from_toml_str(&text)?;
        if let Some(character) = roster.get(config.character) {
            return Ok(character.clone());
        }
    }
    let tier = JobTier::try_from(opts.tier).map_err(anyhow::Error::msg)?;
    Ok(Character {
        id: config.character,
        name: config.character.wire_name(),
        tier,
    })
}

fn export_settings(config: &SessionConfig) -> anyhow::Result<ExportSettings> {
    let shop_background = match &config.paths.shop_background {
        Some(path) => Some(
            image::open(path)
                .with_context(|| format!("can't open the shop background at {:?}", path))?
                .into_rgba8(),
        ),
        None => None,
    };
    Ok(ExportSettings {
        kind: config.export,
        background: config.background_color(),
        shop_background,
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opts = Opts::parse();

    let config = SessionConfig::load(&opts.config)
        .with_context(|| format!("can't load the configuration at {:?}", opts.config))?;
    let character = resolve_character(&opts, &config)?;
    let tree = AssetTree::from_config(&config.paths);
    let mut store = PaletteStore::new();
    let (mut session, diagnostics) = Session::from_config(character, &config, &tree, &mut store)?;
    report(&diagnostics);

    match &opts.command {
        Command::Render { frame, output } => {
            if let Some(notice) = session.select_frame(*frame)? {
                report(&[notice]);
            }
            let bytes = session.export(&export_settings(&config)?)?;
            fs::write(output, bytes).with_context(|| format!("can't write {:?}", output))?;
        }
        Command::Palette { output } => {
            let bytes = chr_palette::export_palette(&session.composed_palette());
            fs::write(output, bytes).with_context(|| format!("can't write {:?}", output))?;
        }
        Command::Batch { output, limit } => {
            let settings = export_settings(&config)?;
            let composed = session.composed_palette();
            let mut done = 0;
            let batch = export_all_frames(
                session.frame_paths(),
                output,
                &composed,
                session.character().palette_id(),
                &settings,
                || {
                    done += 1;
                    limit.map(|limit| done > limit).unwrap_or(false)
                },
            )?;
            report(&batch.diagnostics);
            println!(
                "wrote {} files{}",
                batch.written.len(),
                if batch.cancelled { " (stopped early)" } else { "" }
            );
        }
        Command::Icon {
            category,
            icons,
            output,
        } => {
            let category: Category = category.parse()?;
            if !session.edit_layer(category) {
                bail!("no {} layer is selected in the configuration", category);
            }
            let snapshot = match session.snapshot() {
                Some(snapshot) => snapshot,
                None => bail!("no {} layer is selected in the configuration", category),
            };
            fs::create_dir_all(output)
                .with_context(|| format!("can't create the directory {:?}", output))?;
            for pair in find_icon_pairs(icons)? {
                let reference = match ReferenceIcon::load(&pair.image, &pair.palette) {
                    Ok(reference) => reference,
                    Err(err) => {
                        report(&[Diagnostic::from_error(&err, pair.stem.clone())]);
                        continue;
                    }
                };
                let icon = remap_icon(
                    &reference,
                    &snapshot.palette,
                    session.character().palette_id(),
                    category,
                    config.icon_reversed,
                );
                let target = output.join(format!("{}.bmp", pair.stem));
                fs::write(&target, icon.to_bmp_bytes()?)
                    .with_context(|| format!("can't write {:?}", target))?;
            }
        }
        Command::Recolor {
            category,
            index,
            color,
            to,
            name,
        } => {
            let category: Category = category.parse()?;
            if !session.edit_layer(category) {
                bail!("no {} layer is selected in the configuration", category);
            }
            let editor = session.editor_mut();
            if let Some(notice) = editor.select(*index, SelectModifier::None) {
                report(&[notice]);
            }
            if let Some(notice) = to.and_then(|to| editor.select(to, SelectModifier::Range)) {
                report(&[notice]);
            }
            let cycle = match session.apply_edit(EditRequest::Hex(color.clone())) {
                Some(cycle) => cycle?,
                None => bail!("the {} layer can't be edited", category),
            };
            report(&cycle.outcome.diagnostics);
            let mut layer = match session.snapshot() {
                Some(layer) => layer,
                None => bail!("the {} layer disappeared", category),
            };
            if let Some(name) = name {
                layer.name = name.clone();
            }
            let path = tree.save_custom(&mut store, session.character().id, &layer)?;
            println!("saved {:?}", path);
        }
    }
    Ok(())
}
