use midiflux_lib::streams::InputBridge;

fn main() -> anyhow::Result<()> {
    let bridge = InputBridge::with_default_driver()?;

    let Some(source) = bridge.sources().into_iter().next() else {
        anyhow::bail!("no MIDI sources available");
    };

    println!("listening on {} ({})", source.display_name, source.unique_id);

    let notes = bridge
        .open_stream(source.unique_id, None)
        .subscribe()?
        .to_note_names();

    for note in notes.iter() {
        println!("{note}");
    }

    Ok(())
}
