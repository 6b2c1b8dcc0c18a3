//! Common interface of the CPU execution strategies

use particle_physics::ParticleStore;

/// Advances every particle of a store by one step.
///
/// Implementations are synchronous: when `advance_by` returns, every particle
/// has been updated and no worker still holds a borrow of the store.
pub trait Updater {
    /// Short label used in logs and benchmark summaries
    fn name(&self) -> &'static str;

    /// One simulation step with an explicit timestep
    fn advance_by(&mut self, store: &mut ParticleStore, dt: f32);

    /// One simulation step with the store's configured timestep
    fn advance(&mut self, store: &mut ParticleStore) {
        let dt = store.config().dt;
        self.advance_by(store, dt);
    }
}
