pub mod key;

pub mod source;

pub mod sampler;

pub mod splitter;

pub mod boundary;

pub mod partitioner;

pub mod router;

pub mod distribute;

pub mod job;
