/// A source of initial parameter values, drawn a chunk at a time until it runs dry.
pub trait ParamGen {
    /// Draws up to `n` values, fewer when the generator is about to run out.
    ///
    /// # Returns
    /// `None` once every value has been drawn.
    fn sample(&mut self, n: usize) -> Option<Vec<f32>>;
}
