//! Classification of submit-command stderr.

/// Known-benign warning the elevation helper writes to stderr.
const PTHREAD_WARNING: &str = "It appears that the value of pthread_mutex_init";

/// Classify stderr from a submission attempt.
///
/// Returns `(is_real_error, message)`. Unmatched text defaults to a real
/// error carrying the original output.
pub fn parse_submit_error(error: &str) -> (bool, String) {
    if error.contains("ERROR: proxy has expired\n") {
        return (true, "CRITICAL ERROR: Your proxy has expired!\n".to_string());
    }
    if error.contains("999100\n") {
        return (
            true,
            "CRITICAL ERROR: Failed to build submit command!\n".to_string(),
        );
    }
    if error.contains("Failed to open command file") {
        return (
            true,
            "CONDOR ERROR: jdl file not found by submitted jobs!\n".to_string(),
        );
    }
    if error.contains(PTHREAD_WARNING) {
        // The helper insists on writing this to stderr; alone on its own
        // line it carries no information.
        let lines: Vec<&str> = error.split('\n').collect();
        if lines.len() == 2 && lines[1].is_empty() {
            return (false, error.to_string());
        }
    }
    (true, error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expired_proxy() {
        let (real, message) = parse_submit_error("ERROR: proxy has expired\n");
        assert!(real);
        assert!(message.contains("proxy has expired"));
    }

    #[test]
    fn test_no_command_tag() {
        let (real, message) = parse_submit_error("999100\n Got no command!");
        assert!(real);
        assert!(message.contains("Failed to build submit command"));
    }

    #[test]
    fn test_missing_submit_file() {
        let (real, message) =
            parse_submit_error("Failed to open command file /tmp/submit_1_1.jdl");
        assert!(real);
        assert!(message.contains("jdl file not found"));
    }

    #[test]
    fn test_lone_pthread_warning_is_benign() {
        let warning =
            "It appears that the value of pthread_mutex_init is wrong on this system\n";
        let (real, message) = parse_submit_error(warning);
        assert!(!real);
        assert_eq!(message, warning);
    }

    #[test]
    fn test_pthread_warning_with_company_is_real() {
        let stderr =
            "It appears that the value of pthread_mutex_init is wrong on this system\nsomething else broke\n";
        let (real, _) = parse_submit_error(stderr);
        assert!(real);
    }

    #[test]
    fn test_unmatched_text_is_a_real_error() {
        let (real, message) = parse_submit_error("some novel failure\n");
        assert!(real);
        assert_eq!(message, "some novel failure\n");
    }
}
