mod classifier;
mod describe;
mod fuzzy;
mod graph_backward;
mod graph_forward;
mod graph_handle;
mod window;
