//! Record five seconds from the default microphone to `dictation.wav`,
//! printing a live level meter.
//!
//! ```sh
//! cargo run -p mic-capture-cpal --example record
//! ```

use std::io::Write;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use mic_capture_core::{storage, AudioRecorder, LevelCallback};
use mic_capture_cpal::{list_input_devices, CpalInputProvider};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    for device in list_input_devices()? {
        let marker = if device.is_default { " (default)" } else { "" };
        println!("input device: {}{marker}", device.name);
    }

    let level_callback: LevelCallback = Arc::new(|level| {
        let bars = ((level * 10.0).round() as usize).min(10);
        print!("\rrecording [{}{}]", "|".repeat(bars), " ".repeat(10 - bars));
        let _ = std::io::stdout().flush();
    });

    let mut recorder = AudioRecorder::new(CpalInputProvider::default_device());
    recorder.start("dictation.wav", Some(level_callback))?;
    thread::sleep(Duration::from_secs(5));
    let outcome = recorder.stop()?;

    println!(
        "\nwrote {} ({:.1} s, {} samples)",
        outcome.path.display(),
        outcome.duration_secs,
        outcome.samples_written
    );
    storage::write_metadata(&outcome.metadata, &outcome.path)?;
    Ok(())
}
