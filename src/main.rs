fn main() {
    std::process::exit(gerritclone::entrypoint());
}
