fn main() {
    if let Err(err) = wgpu_drawkit::run() {
        eprintln!("Application error: {err}");
    }
}
