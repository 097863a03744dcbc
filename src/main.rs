//! Game Boy emulator entry point.
//!
//! Opens a 160x144 window, wires a pull-based audio stream through rodio, polls keys each
//! frame, and runs the emulator at its native ~59.7 fps. Ported from the reference SDL
//! frontend (`platform/sdl/main.cpp`): construct, load boot ROM + game, attach audio,
//! per-frame key poll + `Frame()` call, FPS in the window title.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use faeboy::emulator::Emulator;
use faeboy::joypad::Key;
use faeboy::ppu::ppu::{SCREEN_HEIGHT, SCREEN_WIDTH};
use minifb::{Window, WindowOptions};

/// ~59.7275 Hz (DMG). Target one frame per ~16.74 ms for accurate pacing.
const FRAME_DURATION: Duration = Duration::from_nanos(16_742_706);

#[derive(Parser)]
#[command(about = "A Game Boy emulator")]
struct Args {
    /// Path to the cartridge ROM (.gb/.gbc).
    rom: PathBuf,

    /// Optional boot ROM dump (256 bytes DMG, or 2304 bytes CGB).
    #[arg(long)]
    boot_rom: Option<PathBuf>,

    /// Override the battery save file path (defaults to `<rom>.sav`).
    #[arg(long)]
    save: Option<PathBuf>,

    /// Audio output sample rate in Hz.
    #[arg(long, default_value_t = 44_100)]
    sample_rate: u32,

    /// Run without opening a window or audio device (useful for headless testing).
    #[arg(long)]
    headless: bool,
}

/// Keyboard -> joypad bindings, matching the reference's A/S + arrows + backslash + enter.
fn poll_keys(window: &Window, emulator: &mut Emulator) {
    use minifb::Key as WinKey;
    let bindings = [
        (WinKey::A, Key::A),
        (WinKey::S, Key::B),
        (WinKey::Up, Key::Up),
        (WinKey::Down, Key::Down),
        (WinKey::Left, Key::Left),
        (WinKey::Right, Key::Right),
        (WinKey::Backslash, Key::Select),
        (WinKey::Enter, Key::Start),
    ];
    for (win_key, gb_key) in bindings {
        emulator.set_key_state(gb_key, window.is_key_down(win_key));
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut emulator = Emulator::new();

    if let Some(boot_rom_path) = &args.boot_rom {
        let data = std::fs::read(boot_rom_path).expect("failed to read boot ROM");
        emulator.load_boot_rom(&data).expect("invalid boot ROM");
    }

    let save_path = args.save.clone().unwrap_or_else(|| {
        let mut path = args.rom.clone();
        let extension = path
            .extension()
            .map(|ext| format!("{}.sav", ext.to_string_lossy()))
            .unwrap_or_else(|| "sav".to_string());
        path.set_extension(extension);
        path
    });
    let rom_data = std::fs::read(&args.rom).expect("failed to read ROM");
    emulator.load_game(rom_data, &save_path).expect("failed to load cartridge");

    emulator.set_audio_output_rate(args.sample_rate);

    if args.headless {
        let mut buffer = vec![0u32; SCREEN_WIDTH * SCREEN_HEIGHT];
        loop {
            emulator.frame(&mut buffer);
        }
    }

    let (_stream, stream_handle) =
        rodio::OutputStream::try_default().expect("no default audio device");
    let sink = rodio::Sink::try_new(&stream_handle).expect("failed to create audio sink");
    sink.append(emulator.audio_stream());

    let mut window = Window::new(
        "faeboy",
        SCREEN_WIDTH,
        SCREEN_HEIGHT,
        WindowOptions { resize: true, scale: minifb::Scale::X2, ..WindowOptions::default() },
    )
    .expect("failed to create window");
    window.set_target_fps(60);

    let mut buffer = vec![0u32; SCREEN_WIDTH * SCREEN_HEIGHT];
    let mut frames = 0u32;
    let mut fps_timer = Instant::now();

    while window.is_open() && !window.is_key_down(minifb::Key::Escape) {
        let frame_start = Instant::now();

        poll_keys(&window, &mut emulator);
        emulator.frame(&mut buffer);

        window
            .update_with_buffer(&buffer, SCREEN_WIDTH, SCREEN_HEIGHT)
            .expect("failed to update window");

        frames += 1;
        if fps_timer.elapsed() >= Duration::from_secs(1) {
            window.set_title(&format!("faeboy [{frames} fps]"));
            frames = 0;
            fps_timer = Instant::now();
        }

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }
}
