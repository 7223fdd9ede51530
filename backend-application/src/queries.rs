pub mod deadline_queries;
