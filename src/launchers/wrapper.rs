/// Options of each wrapper that consume the following word.
fn value_options(program: &str) -> &'static [&'static str] {
    match program {
        "sudo" => &["-u", "-g", "-C", "-D", "-h", "-p", "-r", "-t", "-U", "-T"],
        "doas" => &["-u", "-C"],
        "env" => &["-u", "-C", "-S"],
        "nice" => &["-n"],
        "stdbuf" => &["-i", "-o", "-e"],
        "time" => &["-f", "-o"],
        _ => &[],
    }
}

/// Number of words after a transparent wrapper that belong to the wrapper
/// itself: its options, their values, and for `env` the `NAME=value`
/// assignments. The wrapped program follows.
pub fn option_words(program: &str, args: &[Option<String>]) -> usize {
    let values = value_options(program);
    let mut i = 0;
    while let Some(Some(word)) = args.get(i) {
        if word == "--" {
            return i + 1;
        }
        if values.contains(&word.as_str()) {
            i += 2;
            continue;
        }
        let is_option = word.starts_with('-') && word.len() > 1;
        let is_assignment = program == "env" && word.contains('=') && !word.starts_with('=');
        if !is_option && !is_assignment {
            break;
        }
        i += 1;
    }
    i.min(args.len())
}
