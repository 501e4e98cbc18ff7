// Lets `git gerritclone <project>` find us on PATH.
fn main() {
    std::process::exit(gerritclone::entrypoint());
}
