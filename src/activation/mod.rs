pub mod neuron;

pub use neuron::NeuronType;
